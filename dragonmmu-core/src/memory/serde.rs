/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Serializing RAM and ROM buffers as base64 strings or just bytes in binary serializers.
//!
//! With the `compression` feature enabled memory is gzipped before encoding. Compressed and
//! uncompressed data are both accepted when deserializing.
use core::fmt;
use std::borrow::Cow;
use std::rc::Rc;
#[cfg(feature = "compression")] use core::iter::FromIterator;
#[cfg(feature = "compression")] use compression::prelude::*;
#[cfg(feature = "compression")] use serde::ser;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{
    Serializer, Deserialize, Deserializer,
    de::{self, Visitor}
};

pub fn serialize_mem<T, S>(mem: &T, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer,
          T: MemSerExt
{
    #[cfg(not(feature = "compression"))]
    {
        serialize_mem_slice(mem.as_slice(), serializer)
    }
    #[cfg(feature = "compression")]
    {
        let compr = mem.as_slice().iter().copied()
            .encode(&mut GZipEncoder::new(), Action::Finish)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ser::Error::custom)?;
        serialize_mem_slice(&compr, serializer)
    }
}

pub fn serialize_mem_slice<S>(slice: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
{
    if serializer.is_human_readable() {
        serializer.serialize_str(&STANDARD.encode(slice))
    }
    else {
        serializer.serialize_bytes(slice)
    }
}

pub fn deserialize_mem<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where T: MemDeExt,
          D: Deserializer<'de>
{
    if deserializer.is_human_readable() {
        Deserialize::deserialize(deserializer).and_then(|string: Cow<str>|
            STANDARD.decode(&*string).map_err(de::Error::custom)
        )
        .and_then(T::try_from_byte_buf)
    }
    else {
        deserializer.deserialize_byte_buf(ByteBufVisitor)
                    .and_then(T::try_from_byte_buf)
    }
}

pub trait MemSerExt {
    fn as_slice(&self) -> &[u8];
}

pub trait MemDeExt: Sized {
    fn try_from_byte_buf<E: de::Error>(buf: Vec<u8>) -> Result<Self, E>;
}

impl MemSerExt for Box<[u8]> {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl MemSerExt for Rc<[u8]> {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl<T: MemSerExt> MemSerExt for &T {
    fn as_slice(&self) -> &[u8] {
        T::as_slice(self)
    }
}

impl MemDeExt for Box<[u8]> {
    fn try_from_byte_buf<E: de::Error>(buf: Vec<u8>) -> Result<Self, E> {
        inflate(buf).map(Vec::into_boxed_slice)
    }
}

impl MemDeExt for Rc<[u8]> {
    fn try_from_byte_buf<E: de::Error>(buf: Vec<u8>) -> Result<Self, E> {
        inflate(buf).map(Rc::from)
    }
}

#[cfg(feature = "compression")]
fn inflate<E: de::Error>(buf: Vec<u8>) -> Result<Vec<u8>, E> {
    if is_compressed(&buf) {
        decompress(&buf)
    }
    else {
        Ok(buf)
    }
}

#[cfg(not(feature = "compression"))]
fn inflate<E: de::Error>(buf: Vec<u8>) -> Result<Vec<u8>, E> {
    Ok(buf)
}

struct ByteBufVisitor;

impl Visitor<'_> for ByteBufVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a byte array")
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(Vec::from(v))
    }
}

#[cfg(feature = "compression")]
fn is_compressed(data: &[u8]) -> bool {
    matches!(data.get(0..3), Some(&[0x1f, 0x8b, 0x08]))
}

#[cfg(feature = "compression")]
fn decompress<T: FromIterator<u8>, E: de::Error>(data: &[u8]) -> Result<T, E> {
    data.iter().copied()
        .decode(&mut GZipDecoder::new())
        .collect::<Result<T, _>>()
        .map_err(de::Error::custom)
}
