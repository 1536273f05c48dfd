/// Kite endpoint URLs and path templates
pub const LOGIN_URL: &str = "https://kite.zerodha.com/api/login";
pub const TWOFA_URL: &str = "https://kite.zerodha.com/api/twofa";
pub const ROOT_URL: &str = "https://api.kite.trade";

pub const USER_PROFILE: &str = "/user/profile";
pub const USER_MARGINS: &str = "/user/margins";
pub const ORDERS: &str = "/orders";
pub const TRADES: &str = "/trades";
pub const ORDER_INFO: &str = "/orders/:order_id";
pub const ORDER_TRADES: &str = "/orders/:order_id/trades";
pub const PLACE_ORDER: &str = "/orders/:variety";
pub const MODIFY_ORDER: &str = "/orders/:variety/:order_id";
pub const CANCEL_ORDER: &str = "/orders/:variety/:order_id";
pub const INSTRUMENTS: &str = "/instruments";

/// Build a full trading-API URL from a path template, substituting
/// `:placeholder` segments.
pub fn resolve(template: &str, params: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (key, value) in params {
        path = path.replace(&format!(":{}", key), value);
    }
    format!("{}{}", ROOT_URL, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_single_placeholder() {
        let url = resolve(ORDER_INFO, &[("order_id", "151220000000000")]);
        assert_eq!(url, "https://api.kite.trade/orders/151220000000000");
    }

    #[test]
    fn test_resolve_multiple_placeholders() {
        let url = resolve(
            MODIFY_ORDER,
            &[("variety", "regular"), ("order_id", "151220000000000")],
        );
        assert_eq!(
            url,
            "https://api.kite.trade/orders/regular/151220000000000"
        );
    }

    #[test]
    fn test_resolve_without_placeholders() {
        let url = resolve(USER_MARGINS, &[]);
        assert_eq!(url, "https://api.kite.trade/user/margins");
    }
}
