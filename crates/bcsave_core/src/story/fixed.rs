use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S, T, const N: usize>(items: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(items.iter())
}

/// Shorter sequences are padded with default entries; longer ones are rejected.
pub fn deserialize<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let mut items = Vec::<T>::deserialize(deserializer)?;
    if items.len() > N {
        return Err(D::Error::custom(format!(
            "expected at most {N} entries, got {}",
            items.len()
        )));
    }
    items.resize_with(N, T::default);
    items
        .try_into()
        .map_err(|_| D::Error::custom(format!("expected exactly {N} entries")))
}
