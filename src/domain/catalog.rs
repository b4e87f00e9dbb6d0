use bigdecimal::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub digital: bool,
    pub image: Option<String>,
}

impl Product {
    /// Image location for templates; products without an image render an
    /// empty `src`.
    pub fn image_url(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }

    pub fn requires_shipping(&self) -> bool {
        !self.digital
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(image: Option<&str>, digital: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Watch".to_string(),
            price: BigDecimal::from(10),
            digital,
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn image_url_falls_back_to_empty_string() {
        assert_eq!(product(None, false).image_url(), "");
        assert_eq!(
            product(Some("/static/watch.jpg"), false).image_url(),
            "/static/watch.jpg"
        );
    }

    #[test]
    fn only_physical_products_require_shipping() {
        assert!(product(None, false).requires_shipping());
        assert!(!product(None, true).requires_shipping());
    }
}
