use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for customer-supplied text (shipping addresses, contact details)
/// that must not leak through Debug/Display formatting in log macros.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Masked(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<masked>")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<masked>")
    }
}

// API responses and persisted documents carry the real value; masking only
// guards the formatting paths.
impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_masked() {
        let address = Masked::new("12 Harbor Lane, Colombo".to_string());
        assert_eq!(format!("{:?}", address), "<masked>");
        assert_eq!(format!("{}", address), "<masked>");
        assert_eq!(address.expose(), "12 Harbor Lane, Colombo");
    }

    #[test]
    fn serialization_carries_real_value() {
        let address = Masked::new("12 Harbor Lane, Colombo".to_string());
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"12 Harbor Lane, Colombo\"");
    }
}
