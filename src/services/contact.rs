use crate::config::ContactConfig;

/// WhatsApp deep link asking about `product_title`, or `None` when no
/// contact number is configured.
#[must_use]
pub fn contact_link(config: &ContactConfig, product_title: &str) -> Option<String> {
    let phone: String = config
        .phone_number
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if phone.is_empty() {
        return None;
    }

    let message = config.message_template.replace("{title}", product_title);
    Some(format!(
        "https://wa.me/{phone}?text={}",
        urlencoding::encode(&message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_encodes_message() {
        let config = ContactConfig {
            phone_number: "254700000000".to_string(),
            ..ContactConfig::default()
        };
        assert_eq!(
            contact_link(&config, "Gel 12V/100Ah").as_deref(),
            Some("https://wa.me/254700000000?text=Hello%2C%20I%27m%20interested%20in%20Gel%2012V%2F100Ah")
        );
    }

    #[test]
    fn test_no_phone_no_link() {
        assert!(contact_link(&ContactConfig::default(), "Anything").is_none());
    }
}
