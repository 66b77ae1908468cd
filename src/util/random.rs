//! Random identifiers from the operating system's secure source.

/// `byte_len` random bytes as lower-case hex (`2 * byte_len` characters).
pub fn random_hex(byte_len: usize) -> Result<String, getrandom::Error> {
    let mut bytes = vec![0u8; byte_len];
    getrandom::fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn length_and_alphabet() {
        for len in [0, 1, 4, 16] {
            let id = random_hex(len).unwrap();
            assert_eq!(id.len(), len * 2);
            assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')), "{id}");
        }
    }

    // Probabilistic: 10,000 draws from 2^32 collide with probability ~1.2%.
    #[test]
    fn four_bytes_rarely_repeat() {
        let ids: HashSet<String> = (0..10_000).map(|_| random_hex(4).unwrap()).collect();
        assert!(ids.len() >= 9_998, "unexpected collisions: {}", 10_000 - ids.len());
    }
}
