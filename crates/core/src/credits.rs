//! Credit accounting rules.
//!
//! A successful generation costs exactly one credit. Purchases arrive via
//! the billing webhook as order-paid events carrying a product id; the
//! product-to-credits mapping is configured at startup.

/// Credits consumed by one successful generation.
pub const CREDITS_PER_GENERATION: i64 = 1;

/// Credits granted by the small purchase pack.
pub const SMALL_PACK_CREDITS: i64 = 10;

/// Credits granted by the medium purchase pack.
pub const MEDIUM_PACK_CREDITS: i64 = 25;

/// Credits granted by the large purchase pack.
pub const LARGE_PACK_CREDITS: i64 = 50;

/// Configured billing product ids for the three credit packs.
#[derive(Debug, Clone)]
pub struct CreditPacks {
    pub small_product_id: String,
    pub medium_product_id: String,
    pub large_product_id: String,
}

impl CreditPacks {
    /// Credits granted for a paid order of `product_id`.
    ///
    /// Unknown products grant nothing; the billing collaborator may sell
    /// products this service does not account for.
    pub fn credits_for_product(&self, product_id: &str) -> i64 {
        if product_id == self.small_product_id {
            SMALL_PACK_CREDITS
        } else if product_id == self.medium_product_id {
            MEDIUM_PACK_CREDITS
        } else if product_id == self.large_product_id {
            LARGE_PACK_CREDITS
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packs() -> CreditPacks {
        CreditPacks {
            small_product_id: "prod-small".to_string(),
            medium_product_id: "prod-medium".to_string(),
            large_product_id: "prod-large".to_string(),
        }
    }

    #[test]
    fn known_packs_grant_credits() {
        let packs = packs();
        assert_eq!(packs.credits_for_product("prod-small"), 10);
        assert_eq!(packs.credits_for_product("prod-medium"), 25);
        assert_eq!(packs.credits_for_product("prod-large"), 50);
    }

    #[test]
    fn unknown_product_grants_nothing() {
        assert_eq!(packs().credits_for_product("prod-other"), 0);
    }
}
