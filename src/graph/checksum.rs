use crate::types::Distance;

/// Fletcher-16 over the matrix entries in storage order (column-major).
pub fn fletcher16(data: &[Distance]) -> u16 {
    let mut sum1: i64 = 0;
    let mut sum2: i64 = 0;

    for &value in data {
        sum1 = (sum1 + value as i64).rem_euclid(255);
        sum2 = (sum2 + sum1) % 255;
    }

    ((sum2 << 8) | sum1) as u16
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fletcher16() {
        assert_eq!(fletcher16(&[]), 0);
        assert_eq!(fletcher16(&[1]), 0x0101);
        assert_eq!(fletcher16(&[1, 2]), 0x0403);

        // "abcde" from the usual Fletcher-16 test vectors.
        let abcde = b"abcde".iter().map(|&c| c as Distance).collect::<Vec<_>>();
        assert_eq!(fletcher16(&abcde), 0xC8F0);

        let abcdef = b"abcdef".iter().map(|&c| c as Distance).collect::<Vec<_>>();
        assert_eq!(fletcher16(&abcdef), 0x2057);

        // Order matters.
        assert_ne!(fletcher16(&[1, 2, 3]), fletcher16(&[3, 2, 1]));
    }
}
