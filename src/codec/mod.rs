// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Storage codec for values persisted through the backend key-value
//! interface. Consensus structures use [`wire`] instead.

pub mod wire;

pub use wire::{CodecErr, Reader, Writer};

pub const CODEC_BYTES_LIMIT: usize = 1_000_000;

pub fn encode_to_vec<T: bincode::Encode>(val: &T) -> Result<Vec<u8>, bincode::error::EncodeError> {
    let config = bincode::config::standard()
        .with_little_endian()
        .with_variable_int_encoding()
        .with_limit::<CODEC_BYTES_LIMIT>();

    bincode::encode_to_vec(val, config)
}

pub fn decode<T: bincode::Decode>(bytes: &[u8]) -> Result<T, bincode::error::DecodeError> {
    let config = bincode::config::standard()
        .with_little_endian()
        .with_variable_int_encoding()
        .with_limit::<CODEC_BYTES_LIMIT>();

    bincode::decode_from_slice(bytes, config).map(|r| r.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincode::{Decode, Encode};

    #[derive(Debug, PartialEq, Encode, Decode)]
    enum Status {
        Live(u64),
        Spent,
    }

    #[test]
    fn single_byte_enum_variant() {
        let encoded = encode_to_vec(&Status::Spent).unwrap();
        assert_eq!(encoded.as_slice(), &[1]);
    }

    #[test]
    fn fixed_array_has_no_length_prefix() {
        let encoded = encode_to_vec(&[0xffu8; 32]).unwrap();
        assert_eq!(encoded.len(), 32);
    }

    #[test]
    fn byte_vec_is_length_prefixed() {
        let input: Vec<u8> = vec![0xff, 0xff];
        let encoded = encode_to_vec(&input).unwrap();
        assert_eq!(encoded.as_slice(), &[0x02, 0xff, 0xff]);
    }

    #[test]
    fn enum_roundtrip() {
        let encoded = encode_to_vec(&Status::Live(300)).unwrap();
        let decoded: Status = decode(&encoded).unwrap();
        assert_eq!(decoded, Status::Live(300));
    }
}
