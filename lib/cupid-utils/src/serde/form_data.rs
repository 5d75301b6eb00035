//! Deserializer for `application/x-www-form-urlencoded` request bodies,
//! enough for the forms this application posts: string (and optional string)
//! fields in `key=value&key=value` form, with `+` and percent-escapes decoded.

use std::fmt::Display;

use serde::{de, Deserialize};

pub fn from_str<'a, T>(s: &'a str) -> Result<T, Error>
where
    T: Deserialize<'a>,
{
    let deserializer = FormDeserializer::new(s);
    let t = T::deserialize(deserializer)?;
    Ok(t)
}

#[derive(Debug, PartialEq)]
pub enum Error {
    Message(String),
    Unsupported(&'static str),
    MissingKey(String),
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Message(msg) => f.write_str(msg),
            Error::Unsupported(what) => write!(f, "unsupported operation: {what}"),
            Error::MissingKey(rest) => write!(f, "can't parse key from: {rest}"),
        }
    }
}

impl std::error::Error for Error {}

macro_rules! unsupported {
    ($func_name:ident) => {
        fn $func_name<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            Err(Error::Unsupported(stringify!($func_name)))
        }
    };
    ($func_name:ident, $($arg:ident: $arg_type:ty),*) => {
        fn $func_name<V>(self, $($arg: $arg_type,)* _visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            Err(Error::Unsupported(stringify!($func_name)))
        }
    };
}

struct FormDeserializer<'de> {
    input: &'de str,
}

impl<'de> FormDeserializer<'de> {
    fn new(input: &'de str) -> Self {
        FormDeserializer { input }
    }
}

impl<'de> de::Deserializer<'de> for FormDeserializer<'de> {
    type Error = Error;

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(Pairs::new(self.input))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    unsupported!(deserialize_any);
    unsupported!(deserialize_bool);
    unsupported!(deserialize_i8);
    unsupported!(deserialize_i16);
    unsupported!(deserialize_i32);
    unsupported!(deserialize_i64);
    unsupported!(deserialize_u8);
    unsupported!(deserialize_u16);
    unsupported!(deserialize_u32);
    unsupported!(deserialize_u64);
    unsupported!(deserialize_f32);
    unsupported!(deserialize_f64);
    unsupported!(deserialize_char);
    unsupported!(deserialize_bytes);
    unsupported!(deserialize_byte_buf);
    unsupported!(deserialize_option);
    unsupported!(deserialize_unit);
    unsupported!(deserialize_seq);
    unsupported!(deserialize_str);
    unsupported!(deserialize_string);
    unsupported!(deserialize_identifier);
    unsupported!(deserialize_ignored_any);
    unsupported!(deserialize_tuple, _len: usize);
    unsupported!(deserialize_unit_struct, _name: &'static str);
    unsupported!(deserialize_newtype_struct, _name: &'static str);
    unsupported!(deserialize_tuple_struct, _name: &'static str, _len: usize);
    unsupported!(deserialize_enum, _name: &'static str, _variants: &'static [&'static str]);
}

struct Pairs<'de> {
    rest: &'de str,
}

impl<'de> Pairs<'de> {
    fn new(rest: &'de str) -> Self {
        Pairs { rest }
    }
}

impl<'de> de::MapAccess<'de> for Pairs<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        if self.rest.is_empty() {
            return Ok(None);
        };

        match self.rest.split_once('=') {
            Some((key, rest)) => {
                self.rest = rest;
                seed.deserialize(Value(key)).map(Some)
            }
            None => Err(Error::MissingKey(self.rest.into())),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        // an empty value ("bio=") is still a value, but an exhausted input
        // after a key is a malformed pair
        match self.rest.split_once('&') {
            Some((value, rest)) => {
                self.rest = rest;
                seed.deserialize(Value(value))
            }
            None => {
                let value = self.rest;
                self.rest = "";
                seed.deserialize(Value(value))
            }
        }
    }
}

struct Value<'de>(&'de str);

impl<'de> de::Deserializer<'de> for Value<'de> {
    type Error = Error;

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(decode(self.0))
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(decode(self.0))
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_str("")
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    unsupported!(deserialize_str);
    unsupported!(deserialize_any);
    unsupported!(deserialize_bool);
    unsupported!(deserialize_i8);
    unsupported!(deserialize_i16);
    unsupported!(deserialize_i32);
    unsupported!(deserialize_i64);
    unsupported!(deserialize_u8);
    unsupported!(deserialize_u16);
    unsupported!(deserialize_u32);
    unsupported!(deserialize_u64);
    unsupported!(deserialize_f32);
    unsupported!(deserialize_f64);
    unsupported!(deserialize_char);
    unsupported!(deserialize_bytes);
    unsupported!(deserialize_byte_buf);
    unsupported!(deserialize_unit);
    unsupported!(deserialize_seq);
    unsupported!(deserialize_map);
    unsupported!(deserialize_tuple, _len: usize);
    unsupported!(deserialize_unit_struct, _name: &'static str);
    unsupported!(deserialize_newtype_struct, _name: &'static str);
    unsupported!(deserialize_tuple_struct, _name: &'static str, _len: usize);
    unsupported!(deserialize_enum, _name: &'static str, _variants: &'static [&'static str]);
    unsupported!(deserialize_struct, _name: &'static str, _fields: &'static [&'static str]);
}

fn decode(text: &str) -> String {
    let mut res = String::new();
    url_escape::decode_to_string(text.replace('+', " "), &mut res);
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Debug, Deserialize)]
    struct Credentials {
        username: String,
        password: String,
    }

    #[derive(PartialEq, Debug, Deserialize)]
    struct Registration {
        username: String,
        password: String,
        bio: Option<String>,
    }

    #[derive(PartialEq, Debug, Deserialize)]
    struct MessageForm {
        content: String,
    }

    #[test]
    fn two_string_fields() {
        let res: Credentials = from_str("username=alice&password=hunter2").unwrap();
        assert_eq!(
            res,
            Credentials {
                username: "alice".into(),
                password: "hunter2".into(),
            }
        )
    }

    #[test]
    fn optional_field_missing() {
        let res: Registration = from_str("username=alice&password=hunter2").unwrap();
        assert_eq!(res.bio, None);
    }

    #[test]
    fn optional_field_present() {
        let res: Registration = from_str("username=alice&password=hunter2&bio=hello").unwrap();
        assert_eq!(res.bio, Some("hello".into()));
    }

    #[test]
    fn empty_value_is_empty_string() {
        let res: Registration = from_str("username=alice&password=hunter2&bio=").unwrap();
        assert_eq!(res.bio, Some("".into()));
    }

    #[test]
    fn ignores_unknown_fields() {
        let res: Credentials =
            from_str("username=alice&submit=Log+in&password=hunter2").unwrap();
        assert_eq!(
            res,
            Credentials {
                username: "alice".into(),
                password: "hunter2".into(),
            }
        )
    }

    #[test]
    fn decodes_pluses_as_spaces() {
        let res: MessageForm = from_str("content=hi+there").unwrap();
        assert_eq!(res.content, "hi there");
    }

    #[test]
    fn decodes_percent_escapes() {
        let res: MessageForm = from_str("content=How%20are%20you%3F").unwrap();
        assert_eq!(res.content, "How are you?");
    }

    #[test]
    fn decodes_literal_plus() {
        let res: MessageForm = from_str("content=you%2Bme").unwrap();
        assert_eq!(res.content, "you+me");
    }

    #[test]
    fn decodes_multibyte_content() {
        let res: MessageForm = from_str("content=%D0%9F%D1%80%D0%B8%D0%B2%D0%B5%D1%82%21").unwrap();
        assert_eq!(res.content, "Привет!");
    }

    #[test]
    fn fails_on_dangling_key() {
        let res: Result<MessageForm, _> = from_str("content");
        assert!(matches!(res, Err(Error::MissingKey(_))));
    }
}
