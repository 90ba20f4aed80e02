#![cfg(feature = "serde1")]

use rand_core::{RngCore, SeedableRng};
use rand_counter::{Philox2x64Rng, Philox4x32Rng, Threefry2x32Rng, Threefry4x64Rng};

macro_rules! serde_rng {
    ($rng:ident) => {
        use std::io::{BufReader, BufWriter};

        let mut rng = $rng::seed_from_u64(0);
        // Serialize mid-block so the buffered words matter too.
        rng.next_u32();

        let buf: Vec<u8> = Vec::new();
        let mut buf = BufWriter::new(buf);
        bincode::serialize_into(&mut buf, &rng).expect("Could not serialize");

        let buf = buf.into_inner().unwrap();
        let mut read = BufReader::new(&buf[..]);
        let mut deserialized: $rng =
            bincode::deserialize_from(&mut read).expect("Could not deserialize");

        assert_eq!(rng, deserialized);
        for _ in 0..16 {
            assert_eq!(rng.next_u64(), deserialized.next_u64());
        }
    };
}

#[test]
fn test_threefry2x32() {
    serde_rng!(Threefry2x32Rng);
}

#[test]
fn test_threefry4x64() {
    serde_rng!(Threefry4x64Rng);
}

#[test]
fn test_philox4x32() {
    serde_rng!(Philox4x32Rng);
}

#[test]
fn test_philox2x64() {
    serde_rng!(Philox2x64Rng);
}
