/// Expiry and strike selection over the catalog
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{KiteError, Result};
use crate::instruments::catalog::InstrumentCatalog;
use crate::types::{OptionChainQuery, OptionChainResult};

const EXPIRY_FORMAT: &str = "%Y-%m-%d";

impl InstrumentCatalog {
    /// Distinct expiry dates for an underlying, ascending by calendar date.
    ///
    /// The row's instrument type is matched by prefix, so a shortened query
    /// type selects the more specific row types. Values that do not parse
    /// as dates order after the ones that do.
    pub fn expiry_dates(
        &self,
        exchange: &str,
        name: &str,
        instrument_type: &str,
    ) -> Result<Vec<String>> {
        if exchange.is_empty() || name.is_empty() || instrument_type.is_empty() {
            return Err(KiteError::MissingInput(
                "exchange, name and instrument_type are required".to_string(),
            ));
        }

        let mut expiries: Vec<String> = self
            .instruments()
            .iter()
            .filter(|inst| {
                inst.exchange.as_deref() == Some(exchange)
                    && inst.name.as_deref() == Some(name)
                    && inst
                        .instrument_type
                        .as_deref()
                        .map_or(false, |t| t.starts_with(instrument_type))
            })
            .filter_map(|inst| inst.expiry.clone())
            .collect();

        expiries.sort_by_key(|e| {
            let parsed = NaiveDate::parse_from_str(e, EXPIRY_FORMAT).ok();
            (parsed.is_none(), parsed)
        });
        expiries.dedup();

        debug!(name, instrument_type, count = expiries.len(), "expiry dates resolved");
        Ok(expiries)
    }

    /// Strike ladder around a reference price.
    ///
    /// Matching rows are ranked by distance to the price (stable, so equal
    /// distances keep file order). The head of the ranking is the ATM
    /// strike; `down_strikes` are the ranked strikes strictly below both
    /// price and ATM, `up_strikes` strictly above both, each capped at
    /// `max_strikes` and ordered nearest-to-price first.
    pub fn option_strikes(&self, query: &OptionChainQuery) -> Result<OptionChainResult> {
        if query.price <= 0.0
            || query.name.is_empty()
            || query.expiry.is_empty()
            || query.instrument_type.is_empty()
        {
            return Err(KiteError::MissingInput(
                "price, name, expiry and instrument_type are required".to_string(),
            ));
        }

        let matched: Vec<_> = self
            .instruments()
            .iter()
            .filter(|inst| {
                inst.name.as_deref() == Some(query.name.as_str())
                    && inst.expiry.as_deref() == Some(query.expiry.as_str())
                    && inst.instrument_type.as_deref() == Some(query.instrument_type.as_str())
            })
            .collect();

        if matched.is_empty() {
            return Err(KiteError::InstrumentNotFound(format!(
                "no {} {} contracts expiring {}",
                query.name, query.instrument_type, query.expiry
            )));
        }

        let mut ladder: Vec<(f64, f64)> = matched
            .iter()
            .filter_map(|inst| inst.strike.map(|s| (s, (s - query.price).abs())))
            .collect();
        ladder.sort_by(|a, b| a.1.total_cmp(&b.1));

        let atm_strike = ladder.first().map(|(strike, _)| *strike);

        let (down_strikes, up_strikes) = match atm_strike {
            Some(atm) => (
                ladder
                    .iter()
                    .map(|(strike, _)| *strike)
                    .filter(|s| *s < query.price && *s < atm)
                    .take(query.max_strikes)
                    .collect(),
                ladder
                    .iter()
                    .map(|(strike, _)| *strike)
                    .filter(|s| *s > query.price && *s > atm)
                    .take(query.max_strikes)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Ok(OptionChainResult {
            atm_strike,
            up_strikes,
            down_strikes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_rows(strikes: &[f64]) -> InstrumentCatalog {
        let mut text = String::from(
            "instrument_token,tradingsymbol,name,expiry,strike,instrument_type,segment,exchange\n",
        );
        for (i, strike) in strikes.iter().enumerate() {
            text.push_str(&format!(
                "{},ABC24JUN{}CE,ABC,2024-06-27,{},CE,NFO-OPT,NFO\n",
                i, strike, strike
            ));
        }
        InstrumentCatalog::parse(&text)
    }

    #[test]
    fn test_expiry_dates_sorted_and_deduped() {
        let text = "\
tradingsymbol,name,expiry,strike,instrument_type,exchange
ABC1,ABC,2024-05-30,100,CE,NFO
ABC2,ABC,2024-05-02,100,CE,NFO
ABC3,ABC,2024-05-30,110,CE,NFO
";
        let catalog = InstrumentCatalog::parse(text);
        let expiries = catalog.expiry_dates("NFO", "ABC", "CE").unwrap();
        assert_eq!(expiries, vec!["2024-05-02", "2024-05-30"]);
    }

    #[test]
    fn test_expiry_dates_prefix_matches_instrument_type() {
        let text = "\
tradingsymbol,name,expiry,strike,instrument_type,exchange
ABC1,ABC,2024-05-30,100,CE,NFO
ABC2,ABC,2024-06-27,100,PE,NFO
";
        let catalog = InstrumentCatalog::parse(text);

        // "C" prefix-matches the CE row only
        let expiries = catalog.expiry_dates("NFO", "ABC", "C").unwrap();
        assert_eq!(expiries, vec!["2024-05-30"]);
    }

    #[test]
    fn test_expiry_dates_requires_all_inputs() {
        let catalog = option_rows(&[100.0]);
        assert!(catalog.expiry_dates("", "ABC", "CE").is_err());
        assert!(catalog.expiry_dates("NFO", "", "CE").is_err());
        assert!(catalog.expiry_dates("NFO", "ABC", "").is_err());
    }

    #[test]
    fn test_option_strikes_basic_ladder() {
        let catalog = option_rows(&[100.0, 110.0, 90.0]);
        let query = OptionChainQuery::new(102.0, "ABC", "2024-06-27", "CE");
        let result = catalog.option_strikes(&query).unwrap();

        assert_eq!(result.atm_strike, Some(100.0));
        assert_eq!(result.up_strikes, vec![110.0]);
        assert_eq!(result.down_strikes, vec![90.0]);
    }

    #[test]
    fn test_option_strikes_nearest_first_and_capped() {
        let catalog = option_rows(&[90.0, 95.0, 100.0, 105.0, 110.0, 115.0]);
        let query =
            OptionChainQuery::new(102.0, "ABC", "2024-06-27", "CE").with_max_strikes(2);
        let result = catalog.option_strikes(&query).unwrap();

        assert_eq!(result.atm_strike, Some(100.0));
        // nearest-to-price first, not monotonic by strike
        assert_eq!(result.up_strikes, vec![105.0, 110.0]);
        assert_eq!(result.down_strikes, vec![95.0, 90.0]);
    }

    #[test]
    fn test_option_strikes_invariants() {
        let catalog = option_rows(&[80.0, 85.0, 90.0, 95.0, 100.0, 105.0, 110.0]);
        let query = OptionChainQuery::new(97.0, "ABC", "2024-06-27", "CE").with_max_strikes(3);
        let result = catalog.option_strikes(&query).unwrap();

        let atm = result.atm_strike.unwrap();
        assert!(!result.up_strikes.contains(&atm));
        assert!(!result.down_strikes.contains(&atm));
        assert!(result.up_strikes.len() <= 3);
        assert!(result.down_strikes.len() <= 3);
        assert!(result.down_strikes.iter().all(|s| *s < 97.0));
        assert!(result.up_strikes.iter().all(|s| *s > 97.0));
    }

    #[test]
    fn test_option_strikes_tie_breaks_by_file_order() {
        // 95 and 105 are both 5 away from 100; the earlier row wins ATM
        let catalog = option_rows(&[95.0, 105.0]);
        let query = OptionChainQuery::new(100.0, "ABC", "2024-06-27", "CE");
        let result = catalog.option_strikes(&query).unwrap();
        assert_eq!(result.atm_strike, Some(95.0));

        let reversed = option_rows(&[105.0, 95.0]);
        let result = reversed.option_strikes(&query).unwrap();
        assert_eq!(result.atm_strike, Some(105.0));
    }

    #[test]
    fn test_option_strikes_filters_type_exactly() {
        let text = "\
tradingsymbol,name,expiry,strike,instrument_type,exchange
ABC1,ABC,2024-06-27,100,CE,NFO
ABC2,ABC,2024-06-27,95,PE,NFO
";
        let catalog = InstrumentCatalog::parse(text);
        let query = OptionChainQuery::new(98.0, "ABC", "2024-06-27", "CE");
        let result = catalog.option_strikes(&query).unwrap();

        // the PE row is invisible to a CE query
        assert_eq!(result.atm_strike, Some(100.0));
        assert!(result.down_strikes.is_empty());
    }

    #[test]
    fn test_option_strikes_validation() {
        let catalog = option_rows(&[100.0]);

        let query = OptionChainQuery::new(0.0, "ABC", "2024-06-27", "CE");
        assert!(matches!(
            catalog.option_strikes(&query),
            Err(KiteError::MissingInput(_))
        ));

        let query = OptionChainQuery::new(100.0, "", "2024-06-27", "CE");
        assert!(catalog.option_strikes(&query).is_err());
    }

    #[test]
    fn test_option_strikes_not_found_when_nothing_matches() {
        let catalog = option_rows(&[100.0]);
        let query = OptionChainQuery::new(100.0, "XYZ", "2024-06-27", "CE");
        assert!(matches!(
            catalog.option_strikes(&query),
            Err(KiteError::InstrumentNotFound(_))
        ));
    }
}
