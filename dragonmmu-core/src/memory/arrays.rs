/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of DRAGONMMU, a Rust library for building emulators.

    For the full copyright notice, see the lib.rs file.
*/
//! Serializing const-sized arrays and tables of arrays as tuples.
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr;

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

pub fn serialize<S: Serializer, T: Serialize, const N: usize>(
    data: &[T; N],
    ser: S,
) -> Result<S::Ok, S::Error> {
    let mut tuple = ser.serialize_tuple(N)?;
    for item in data {
        tuple.serialize_element(item)?;
    }
    tuple.end()
}

pub fn deserialize<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
    where D: Deserializer<'de>,
          T: Deserialize<'de>
{
    deserializer.deserialize_tuple(N, ArrayVisitor::<T, N>(PhantomData))
}

struct ArrayVisitor<T, const N: usize>(PhantomData<T>);

impl<'de, T, const N: usize> Visitor<'de> for ArrayVisitor<T, N>
    where T: Deserialize<'de>
{
    type Value = [T; N];

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "an array of length {}", N)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where A: SeqAccess<'de>
    {
        struct Partial<T, const N: usize> {
            data: [MaybeUninit<T>; N],
            len: usize
        }

        impl<T, const N: usize> Drop for Partial<T, N> {
            fn drop(&mut self) {
                for elem in &mut self.data[0..self.len] {
                    unsafe { ptr::drop_in_place(elem.as_mut_ptr()); }
                }
            }
        }

        let mut ary: Partial<T, N> = Partial {
            // an array of MaybeUninit needs no initialization
            data: unsafe { MaybeUninit::uninit().assume_init() },
            len: 0
        };
        while let Some(val) = seq.next_element()? {
            match ary.data.get_mut(ary.len) {
                Some(elem) => {
                    elem.write(val);
                    ary.len += 1;
                }
                None => return Err(de::Error::invalid_length(ary.len + 1, &self))
            }
        }
        if ary.len != N {
            return Err(de::Error::invalid_length(ary.len, &self));
        }
        ary.len = 0;
        Ok(unsafe { (&ary.data as *const _ as *const [T; N]).read() })
    }
}

/// Serializes two-dimensional arrays as a tuple of tuples.
pub mod rows {
    use super::*;

    struct RowRef<'a, T, const B: usize>(&'a [T; B]);

    impl<T: Serialize, const B: usize> Serialize for RowRef<'_, T, B> {
        fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
            super::serialize(self.0, ser)
        }
    }

    struct Row<T, const B: usize>([T; B]);

    impl<'de, T: Deserialize<'de>, const B: usize> Deserialize<'de> for Row<T, B> {
        fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
            super::deserialize(de).map(Row)
        }
    }

    pub fn serialize<S, T, const B: usize, const N: usize>(
            data: &[[T; B]; N],
            ser: S
        ) -> Result<S::Ok, S::Error>
        where S: Serializer, T: Serialize
    {
        let mut tuple = ser.serialize_tuple(N)?;
        for row in data {
            tuple.serialize_element(&RowRef(row))?;
        }
        tuple.end()
    }

    pub fn deserialize<'de, D, T, const B: usize, const N: usize>(de: D) -> Result<[[T; B]; N], D::Error>
        where D: Deserializer<'de>, T: Deserialize<'de>
    {
        let rows: [Row<T, B>; N] = super::deserialize(de)?;
        Ok(rows.map(|Row(row)| row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Registers<const N: usize> {
        #[serde(with = "super")]
        regs: [u8; N],
        #[serde(with = "rows")]
        table: [[u8; 2]; N]
    }

    #[test]
    fn arrays_serde_works() {
        let regs = Registers { regs: [1, 2, 3], table: [[4, 5], [6, 7], [8, 9]] };
        let json = serde_json::to_string(&regs).unwrap();
        assert_eq!(json, r#"{"regs":[1,2,3],"table":[[4,5],[6,7],[8,9]]}"#);
        let regs_de: Registers<3> = serde_json::from_str(&json).unwrap();
        assert_eq!(regs, regs_de);
        assert!(serde_json::from_str::<Registers<2>>(&json).is_err());
        assert!(serde_json::from_str::<Registers<4>>(&json).is_err());
        assert!(serde_json::from_str::<Registers<3>>(
            r#"{"regs":[1,2,3],"table":[[4,5],[6,7,0],[8,9]]}"#).is_err());

        let encoded: Vec<u8> = bincode::serialize(&regs).unwrap();
        assert_eq!(encoded.len(), 9);
        let regs_de: Registers<3> = bincode::deserialize(&encoded).unwrap();
        assert_eq!(regs, regs_de);
    }

    #[test]
    fn arrays_of_owned_values_serde_works() {
        #[derive(PartialEq, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        struct Names(#[serde(with = "super")] [String; 2]);
        let names = Names(["INIT0".to_string(), "INIT1".to_string()]);
        let json = serde_json::to_string(&names).unwrap();
        assert_eq!(json, r#"["INIT0","INIT1"]"#);
        assert!(serde_json::from_str::<Names>(r#"["INIT0"]"#).is_err());
        assert!(serde_json::from_str::<Names>(r#"["a","b","c"]"#).is_err());
        assert_eq!(serde_json::from_str::<Names>(&json).unwrap(), names);
    }
}
