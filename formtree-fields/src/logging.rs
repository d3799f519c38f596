//! Log formatting helpers

use serde::Serialize;
use std::fmt::{self, Debug};

/// Renders a serializable value as YAML inside a log line.
///
/// ```ignore
/// debug!(request = %Pretty(&request), "loading remote field data");
/// ```
///
/// The YAML starts on a new line. Falls back to pretty `Debug` output when
/// the value cannot be serialized.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> Pretty<T> {
    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

impl<T: Serialize + Debug> fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}
