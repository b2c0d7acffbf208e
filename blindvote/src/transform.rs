use crate::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Deterministic object <-> bytes conversion used before every cryptographic operation
pub trait Transformer {
    fn transform<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, Error>;

    /// Returns `None` if the bytes do not describe a `T`
    fn reverse_transform<T: DeserializeOwned>(&self, bytes: &[u8]) -> Option<T>;
}

/// Packed CBOR, with struct fields keyed by index.
///
/// The packed form keeps a serialized ballot well inside a single RSA block.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborTransformer;

impl Transformer for CborTransformer {
    fn transform<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, Error> {
        Ok(serde_cbor::ser::to_vec_packed(value)?)
    }

    fn reverse_transform<T: DeserializeOwned>(&self, bytes: &[u8]) -> Option<T> {
        serde_cbor::from_slice(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_serialization_is_deterministic() {
        let transformer = CborTransformer;
        let ballot = Ballot::new(VoterId::generate(), 3);

        let first = transformer.transform(&ballot).unwrap();
        let second = transformer.transform(&ballot.clone()).unwrap();
        assert_eq!(first, second);

        // Small enough for a 512 bit modulus, and never zero-prefixed
        assert!(first.len() < 64);
        assert_ne!(first[0], 0);

        let decoded: Ballot = transformer.reverse_transform(&first).unwrap();
        assert_eq!(decoded, ballot);
    }

    #[test]
    fn garbage_does_not_deserialize() {
        let transformer = CborTransformer;
        assert!(transformer
            .reverse_transform::<Ballot>(&[4, 6, 8, 0])
            .is_none());
        assert!(transformer.reverse_transform::<SignedBallot>(&[]).is_none());
    }
}
