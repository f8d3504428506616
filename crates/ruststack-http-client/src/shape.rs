//! A serde data model for the non-JSON request locations.
//!
//! Path, query and header encoders all need the same thing from an input: a
//! walk over named fields down to string leaves. [`to_shape`] runs any
//! `Serialize` value through [`ShapeSerializer`] to get that tree, and each
//! encoder flattens it its own way.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::ser::{self, Serializer};

use crate::error::CodecError;

/// A serialized value, reduced to what the path/query/header codecs handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `None`, unit, or a unit struct. Omitted by every encoder.
    Null,
    /// A leaf: numbers, booleans, strings, enum variants, base64 blobs.
    Scalar(String),
    /// A sequence.
    List(Vec<Shape>),
    /// A struct's fields in declaration order.
    Structure(Vec<(String, Shape)>),
    /// A map's entries in iteration order.
    Map(Vec<(String, Shape)>),
}

impl Shape {
    /// Look up a field of a structure (or an entry of a map) by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Shape> {
        match self {
            Self::Structure(fields) | Self::Map(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// The leaf value, if this is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// Serialize a value into a [`Shape`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidMapKey`] for maps keyed by non-scalar values,
/// or whatever the value's `Serialize` impl raises.
pub fn to_shape<T: Serialize + ?Sized>(value: &T) -> Result<Shape, CodecError> {
    value.serialize(ShapeSerializer)
}

/// The serializer behind [`to_shape`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeSerializer;

macro_rules! scalar {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Shape, CodecError> {
                Ok(Shape::Scalar(v.to_string()))
            }
        )*
    };
}

impl Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = CodecError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    scalar!(
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_str: &str,
    );

    fn serialize_bytes(self, v: &[u8]) -> Result<Shape, CodecError> {
        Ok(Shape::Scalar(BASE64.encode(v)))
    }

    fn serialize_none(self) -> Result<Shape, CodecError> {
        Ok(Shape::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Shape, CodecError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, CodecError> {
        Ok(Shape::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Shape, CodecError> {
        Ok(Shape::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Shape, CodecError> {
        Ok(Shape::Scalar(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Shape, CodecError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Shape, CodecError> {
        Ok(Shape::Structure(vec![(
            variant.to_owned(),
            value.serialize(ShapeSerializer)?,
        )]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, CodecError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, CodecError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, CodecError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, CodecError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, CodecError> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<StructBuilder, CodecError> {
        Ok(StructBuilder {
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<StructBuilder, CodecError> {
        self.serialize_struct("", len)
    }
}

/// Collects sequence and tuple elements.
#[derive(Debug)]
pub struct SeqBuilder {
    items: Vec<Shape>,
}

impl SeqBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        self.items.push(value.serialize(ShapeSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::List(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::List(self.items))
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::List(self.items))
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::List(self.items))
    }
}

/// Collects map entries; keys must be scalars.
#[derive(Debug)]
pub struct MapBuilder {
    entries: Vec<(String, Shape)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), CodecError> {
        match key.serialize(ShapeSerializer)? {
            Shape::Scalar(key) => {
                self.pending_key = Some(key);
                Ok(())
            }
            _ => Err(CodecError::InvalidMapKey),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CodecError> {
        let key = self.pending_key.take().ok_or(CodecError::InvalidMapKey)?;
        self.entries.push((key, value.serialize(ShapeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::Map(self.entries))
    }
}

/// Collects struct fields.
#[derive(Debug)]
pub struct StructBuilder {
    fields: Vec<(String, Shape)>,
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        self.fields
            .push((key.to_owned(), value.serialize(ShapeSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::Structure(self.fields))
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Shape;
    type Error = CodecError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Shape, CodecError> {
        Ok(Shape::Structure(self.fields))
    }
}
