use std::io;

/// An error from decoding or encoding a Satisfactory save
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct SaveError(#[from] Box<SaveErrorKind>);

impl SaveError {
    pub(crate) fn new(kind: SaveErrorKind) -> SaveError {
        SaveError(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &SaveErrorKind {
        &self.0
    }
}

impl From<SaveErrorKind> for SaveError {
    fn from(err: SaveErrorKind) -> Self {
        SaveError::new(err)
    }
}

/// Specific type of error
#[derive(thiserror::Error, Debug)]
pub enum SaveErrorKind {
    #[error("invalid magic value: expected {expected} but found {found}")]
    InvalidMagic { expected: i32, found: i32 },

    #[error("unexpected format constant: expected {expected} but found {found}")]
    InvalidHeader { expected: i32, found: i32 },

    #[error("malformed string: {msg}")]
    MalformedString { msg: String },

    #[error("unknown property type: {name}")]
    UnknownPropertyType { name: String },

    #[error("property `{property}` declared a payload of {declared} bytes but {actual} were consumed")]
    PropertyLengthMismatch {
        property: String,
        declared: u32,
        actual: u64,
    },

    #[error("data block {index} declared {declared} bytes but decoding consumed {actual}")]
    DataBlockLengthMismatch {
        index: usize,
        declared: i32,
        actual: u64,
    },

    #[error("component catalog terminated with count {declared} but {actual} entries were decoded")]
    CatalogCountMismatch { declared: u32, actual: usize },

    #[error("header declared {declared} entries but the catalog holds {actual}")]
    EntryCountMismatch { declared: u32, actual: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<io::Error> for SaveError {
    fn from(value: io::Error) -> Self {
        SaveError::from(SaveErrorKind::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_of_error_test() {
        assert_eq!(std::mem::size_of::<SaveError>(), 8);
    }
}
