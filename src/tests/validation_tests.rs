//! Request parameter validation tests.

#[cfg(test)]
mod tests {
    use crate::tests::TREASURY_ADDRESS;
    use crate::validation::{
        normalize_address, validate_address, validate_page, validate_page_size,
        validate_time_range,
    };

    #[test]
    fn well_formed_addresses_pass() {
        assert!(validate_address(TREASURY_ADDRESS).is_ok());
        // Checksummed (mixed-case) addresses are accepted as-is.
        assert!(validate_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").is_ok());
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(validate_address("").is_err());
        assert!(validate_address("0x123").is_err());
        assert!(validate_address("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
        assert!(validate_address("0xZZb86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
        assert!(validate_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb480").is_err());
    }

    #[test]
    fn normalization_lowercases() {
        assert_eq!(
            normalize_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
    }

    #[test]
    fn pagination_bounds() {
        assert_eq!(validate_page(None).unwrap(), 1);
        assert_eq!(validate_page(Some(7)).unwrap(), 7);
        assert!(validate_page(Some(0)).is_err());

        assert_eq!(validate_page_size(None).unwrap(), 25);
        assert!(validate_page_size(Some(0)).is_err());
        assert!(validate_page_size(Some(501)).is_err());
    }

    #[test]
    fn time_range_must_be_ordered() {
        assert_eq!(validate_time_range(None, None).unwrap(), (0, i64::MAX));
        assert_eq!(validate_time_range(Some(10), Some(20)).unwrap(), (10, 20));
        assert!(validate_time_range(Some(20), Some(10)).is_err());
        assert!(validate_time_range(Some(20), Some(20)).is_err());
        assert!(validate_time_range(Some(-5), None).is_err());
    }
}
