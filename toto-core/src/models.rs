use anyhow::{bail, Result};

/// Highest number that can be drawn (numbers run 1..=49).
pub const POOL_SIZE: u8 = 49;

/// Numbers per drawing.
pub const PICK_COUNT: usize = 6;

/// One 6/49 result. `issue` is the running drawing number within `year`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub year: u16,
    pub issue: u32,
    pub numbers: [u8; PICK_COUNT],
}

impl Drawing {
    pub fn new(year: u16, issue: u32, numbers: [u8; PICK_COUNT]) -> Self {
        Self { year, issue, numbers }
    }

    pub fn sorted_numbers(&self) -> [u8; PICK_COUNT] {
        let mut sorted = self.numbers;
        sorted.sort();
        sorted
    }
}

/// Checks arity, range and uniqueness of a drawing's numbers.
pub fn validate_numbers(numbers: &[u8]) -> Result<[u8; PICK_COUNT]> {
    if numbers.len() != PICK_COUNT {
        bail!(
            "A drawing needs exactly {} numbers, got {}",
            PICK_COUNT,
            numbers.len()
        );
    }
    for &n in numbers {
        if n < 1 || n > POOL_SIZE {
            bail!("Number {} out of range (1-{})", n, POOL_SIZE);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Duplicate number: {}", numbers[i]);
            }
        }
    }
    let mut arr = [0u8; PICK_COUNT];
    arr.copy_from_slice(numbers);
    Ok(arr)
}

/// Builds a chronological history from raw rows, one issue per row, all in 2020.
#[cfg(test)]
pub(crate) fn make_test_drawings(rows: &[[u8; PICK_COUNT]]) -> Vec<Drawing> {
    rows.iter()
        .enumerate()
        .map(|(i, numbers)| Drawing::new(2020, i as u32 + 1, *numbers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_numbers_ok() {
        assert_eq!(validate_numbers(&[5, 14, 22, 25, 34, 49]).unwrap(), [5, 14, 22, 25, 34, 49]);
        assert!(validate_numbers(&[49, 1, 2, 3, 4, 5]).is_ok());
    }

    #[test]
    fn test_validate_numbers_wrong_arity() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6, 7]).is_err());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        assert!(validate_numbers(&[0, 2, 3, 4, 5, 6]).is_err());
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 50]).is_err());
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        assert!(validate_numbers(&[1, 2, 3, 3, 5, 6]).is_err());
    }

    #[test]
    fn test_sorted_numbers() {
        let drawing = Drawing::new(2020, 1, [34, 5, 49, 22, 14, 25]);
        assert_eq!(drawing.sorted_numbers(), [5, 14, 22, 25, 34, 49]);
    }

    #[test]
    fn test_make_test_drawings_issues() {
        let drawings = make_test_drawings(&[[1, 2, 3, 4, 5, 6], [2, 3, 4, 5, 6, 7]]);
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[0].issue, 1);
        assert_eq!(drawings[1].issue, 2);
        assert_eq!(drawings[1].numbers, [2, 3, 4, 5, 6, 7]);
    }
}
