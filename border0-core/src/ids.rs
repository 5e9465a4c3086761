//! Composite identifiers
//!
//! Some resources are identified by several parts joined with `:` into the
//! host's single id slot (e.g., `policy_id:socket_id`). Inside the provider
//! they are fixed-arity arrays.

use thiserror::Error;

/// Separator between composite id parts
pub const SEPARATOR: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("unexpected format of id ({id}): {got} parts vs {expected} expected")]
    PartCount {
        id: String,
        got: usize,
        expected: usize,
    },

    #[error("unexpected format of id ({id}): part {index} is empty")]
    EmptyPart { id: String, index: usize },
}

/// Join id parts into a composite id
pub fn encode<const N: usize>(parts: [&str; N]) -> String {
    parts.join(SEPARATOR)
}

/// Split a composite id into exactly `N` non-empty parts
pub fn decode<const N: usize>(id: &str) -> Result<[String; N], IdError> {
    let parts: Vec<String> = id.split(SEPARATOR).map(str::to_string).collect();
    if let Some(index) = parts.iter().position(|p| p.is_empty())
        && parts.len() == N
    {
        return Err(IdError::EmptyPart {
            id: id.to_string(),
            index,
        });
    }
    let got = parts.len();
    parts.try_into().map_err(|_| IdError::PartCount {
        id: id.to_string(),
        got,
        expected: N,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_two_parts() {
        let id = encode(["pol-1", "sock-1"]);
        assert_eq!(id, "pol-1:sock-1");
        let [policy, socket] = decode::<2>(&id).unwrap();
        assert_eq!(policy, "pol-1");
        assert_eq!(socket, "sock-1");
    }

    #[test]
    fn round_trip_three_parts() {
        let id = encode(["a", "b", "c"]);
        assert_eq!(decode::<3>(&id).unwrap(), ["a", "b", "c"].map(String::from));
    }

    #[test]
    fn wrong_part_count() {
        let err = decode::<2>("a:b:c").unwrap_err();
        assert_eq!(
            err,
            IdError::PartCount {
                id: "a:b:c".to_string(),
                got: 3,
                expected: 2
            }
        );
        assert!(err.to_string().contains("3 parts vs 2 expected"));
        assert!(decode::<2>("lonely").is_err());
    }

    #[test]
    fn empty_part_rejected() {
        assert!(matches!(
            decode::<2>("tok1:"),
            Err(IdError::EmptyPart { index: 1, .. })
        ));
    }
}
