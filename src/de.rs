use std::error::Error as StdError;
use std::fmt;
use std::iter::Peekable;
use std::num::{ParseFloatError, ParseIntError};
use std::slice;
use std::str::ParseBoolError;

use serde::de::value::StrDeserializer;
use serde::de::{
    Deserialize, DeserializeSeed, Deserializer, Error as SerdeError,
    IntoDeserializer, SeqAccess, Visitor,
};

/// Deserialize a row of fields into `D`.
///
/// Fields are consumed in column order, so tuples, tuple structs and
/// structs map position by position. A `Vec` (or any sequence) consumes
/// every remaining field. Fields left over after `D` is complete are
/// ignored.
pub fn deserialize_row<'de, D: Deserialize<'de>>(
    row: &'de [String],
) -> Result<D, DeserializeError> {
    let mut de = RowDeserializer { it: row.iter().peekable(), field: 0 };
    D::deserialize(&mut de)
}

struct RowDeserializer<'r> {
    it: Peekable<slice::Iter<'r, String>>,
    /// The number of fields consumed so far.
    field: u64,
}

impl<'r> RowDeserializer<'r> {
    fn next_field(&mut self) -> Result<&'r str, DeserializeError> {
        match self.it.next() {
            None => Err(self.error(DeserializeErrorKind::UnexpectedEndOfRow)),
            Some(field) => {
                self.field += 1;
                Ok(field)
            }
        }
    }

    fn peek_field(&mut self) -> Option<&'r str> {
        self.it.peek().map(|f| f.as_str())
    }

    /// An error about the field most recently consumed.
    fn error(&self, kind: DeserializeErrorKind) -> DeserializeError {
        DeserializeError { field: Some(self.field.saturating_sub(1)), kind }
    }

    fn infer<'de, V: Visitor<'de>>(
        &mut self,
        visitor: V,
    ) -> Result<V::Value, DeserializeError>
    where
        'r: 'de,
    {
        let field = self.next_field()?;
        if let Ok(b) = field.parse::<bool>() {
            visitor.visit_bool(b)
        } else if let Ok(n) = field.parse::<u64>() {
            visitor.visit_u64(n)
        } else if let Ok(n) = field.parse::<i64>() {
            visitor.visit_i64(n)
        } else if let Ok(n) = field.parse::<f64>() {
            visitor.visit_f64(n)
        } else {
            visitor.visit_borrowed_str(field)
        }
    }
}

macro_rules! deserialize_parse {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V: Visitor<'de>>(
            self,
            visitor: V,
        ) -> Result<V::Value, Self::Error> {
            let field = self.next_field()?;
            match field.trim().parse::<$ty>() {
                Ok(value) => visitor.$visit(value),
                Err(err) => Err(self.error(err.into())),
            }
        }
    };
}

impl<'a, 'de: 'a> Deserializer<'de> for &'a mut RowDeserializer<'de> {
    type Error = DeserializeError;

    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.infer(visitor)
    }

    deserialize_parse!(deserialize_bool, visit_bool, bool);
    deserialize_parse!(deserialize_i8, visit_i8, i8);
    deserialize_parse!(deserialize_i16, visit_i16, i16);
    deserialize_parse!(deserialize_i32, visit_i32, i32);
    deserialize_parse!(deserialize_i64, visit_i64, i64);
    deserialize_parse!(deserialize_u8, visit_u8, u8);
    deserialize_parse!(deserialize_u16, visit_u16, u16);
    deserialize_parse!(deserialize_u32, visit_u32, u32);
    deserialize_parse!(deserialize_u64, visit_u64, u64);
    deserialize_parse!(deserialize_f32, visit_f32, f32);
    deserialize_parse!(deserialize_f64, visit_f64, f64);

    fn deserialize_char<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.error(DeserializeErrorKind::ParseChar(
                field.to_string(),
            ))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.next_field()?)
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_bytes(self.next_field()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.peek_field() {
            None => visitor.visit_none(),
            Some("") => {
                self.next_field()?;
                visitor.visit_none()
            }
            Some(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_map<V: Visitor<'de>>(
        self,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(DeserializeError {
            field: None,
            kind: DeserializeErrorKind::Unsupported("map"),
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let field = self.next_field()?;
        let variant: StrDeserializer<'_, DeserializeError> =
            field.into_deserializer();
        visitor.visit_enum(variant)
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.next_field()?;
        visitor.visit_unit()
    }
}

impl<'a, 'de: 'a> SeqAccess<'de> for &'a mut RowDeserializer<'de> {
    type Error = DeserializeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        if self.peek_field().is_none() {
            return Ok(None);
        }
        seed.deserialize(&mut **self).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.it.len())
    }
}

/// An error that occurs when deserializing a row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeserializeError {
    field: Option<u64>,
    kind: DeserializeErrorKind,
}

/// The type of a deserialization error.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DeserializeErrorKind {
    /// A general error message from a `Deserialize` implementation.
    #[error("{0}")]
    Message(String),
    /// The requested type cannot be built from a row of fields.
    #[error("unsupported type: {0}")]
    Unsupported(&'static str),
    /// The row ran out of fields.
    #[error("expected another field, but the row ended")]
    UnexpectedEndOfRow,
    /// A field was not `true` or `false`.
    #[error("{0}")]
    ParseBool(#[from] ParseBoolError),
    /// A field was not an integer of the requested type.
    #[error("{0}")]
    ParseInt(#[from] ParseIntError),
    /// A field was not a float.
    #[error("{0}")]
    ParseFloat(#[from] ParseFloatError),
    /// A field was not a single character.
    #[error("expected a single character but got {0:?}")]
    ParseChar(String),
}

impl DeserializeError {
    /// The index of the field that failed, if known.
    pub fn field(&self) -> Option<u64> {
        self.field
    }

    /// What went wrong.
    pub fn kind(&self) -> &DeserializeErrorKind {
        &self.kind
    }
}

impl SerdeError for DeserializeError {
    fn custom<T: fmt::Display>(msg: T) -> DeserializeError {
        DeserializeError {
            field: None,
            kind: DeserializeErrorKind::Message(msg.to_string()),
        }
    }
}

impl StdError for DeserializeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.kind.source()
    }
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.field {
            None => write!(f, "{}", self.kind),
            Some(field) => write!(f, "field {}: {}", field, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{deserialize_row, DeserializeError, DeserializeErrorKind};

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn de<'de, D: Deserialize<'de>>(
        row: &'de [String],
    ) -> Result<D, DeserializeError> {
        deserialize_row(row)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct City {
        name: String,
        population: Option<u64>,
        coastal: bool,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Kind {
        Small,
        Large,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Id(u32);

    #[test]
    fn tuple() {
        let r = row(&["1", " 2 ", "x", "1.5"]);
        let got: (i32, u8, char, f64) = de(&r).unwrap();
        assert_eq!((1, 2, 'x', 1.5), got);
    }

    #[test]
    fn structs_by_position() {
        let r = row(&["Boston", "", "true"]);
        let got: City = de(&r).unwrap();
        assert_eq!(
            City { name: "Boston".into(), population: None, coastal: true },
            got
        );

        let r = row(&["Kyiv", "2884000", "false"]);
        let got: City = de(&r).unwrap();
        assert_eq!(Some(2884000), got.population);
    }

    #[test]
    fn vec_takes_the_rest() {
        let r = row(&["a", "1", "2", "3"]);
        let got: (String, Vec<i64>) = de(&r).unwrap();
        assert_eq!(("a".to_string(), vec![1, 2, 3]), got);
    }

    #[test]
    fn unit_enum_and_newtype() {
        let r = row(&["Large", "7"]);
        let got: (Kind, Id) = de(&r).unwrap();
        assert_eq!((Kind::Large, Id(7)), got);

        let r = row(&["Medium"]);
        assert!(de::<(Kind,)>(&r).is_err());
    }

    #[test]
    fn bad_integer_reports_field() {
        let r = row(&["1", "two"]);
        let err = de::<(u8, u8)>(&r).unwrap_err();
        assert_eq!(Some(1), err.field());
        match *err.kind() {
            DeserializeErrorKind::ParseInt(_) => {}
            ref kind => panic!("unexpected error kind: {:?}", kind),
        }
        assert!(err.to_string().starts_with("field 1: "));
    }

    #[test]
    fn short_row() {
        let r = row(&["1"]);
        assert!(de::<(u8, u8)>(&r).is_err());
    }

    #[test]
    fn bad_bool_and_char() {
        let r = row(&["yes"]);
        match *de::<(bool,)>(&r).unwrap_err().kind() {
            DeserializeErrorKind::ParseBool(_) => {}
            ref kind => panic!("unexpected error kind: {:?}", kind),
        }
        let r = row(&["ab"]);
        assert_eq!(
            DeserializeErrorKind::ParseChar("ab".to_string()),
            *de::<(char,)>(&r).unwrap_err().kind()
        );
    }

    #[test]
    fn maps_are_unsupported() {
        use std::collections::HashMap;

        let r = row(&["a"]);
        let err = de::<HashMap<String, String>>(&r).unwrap_err();
        assert_eq!(DeserializeErrorKind::Unsupported("map"), *err.kind());
    }
}
