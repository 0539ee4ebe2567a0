use std::fmt;
use std::io;
use std::result;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Timeout,
    TooMuchData,
    IncompleteWrite,
    Read,
    // ISO-TP frame could not be parsed
    InvalidFrame,

    Yaml(serde_yaml::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    fn as_str(&self) -> String {
        match *self {
            Error::Io(ref _io) => String::from("io error"),
            Error::Timeout => String::from("timed out"),
            Error::TooMuchData => String::from("too much data"),
            Error::IncompleteWrite => String::from("only part of the data could be written"),
            Error::Read => String::from("failed to read"),
            Error::InvalidFrame => String::from("invalid ISO-TP frame"),
            Error::Yaml(ref err) => format!("yaml error: {}", err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
