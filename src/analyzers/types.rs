//! Zone kinds and the statistic columns computed for each.

/// Column suffixes, in output order, of the statistics for one zone kind.
pub const STAT_COLUMNS: [&str; 7] = [
    "PRICE_median",
    "PRICE_mean",
    "PRICE_std",
    "UNITPRICE_median",
    "UNITPRICE_mean",
    "UNITPRICE_count",
    "UNITPRICE_std",
];

/// The two zone families listings are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// INE census sections, keyed by CUSEC.
    Census,
    /// idealista marketing zones, keyed by (LOCATIONID, LOCATIONNAME).
    Marketing,
}

impl ZoneKind {
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            ZoneKind::Census => &["CUSEC"],
            ZoneKind::Marketing => &["LOCATIONID", "LOCATIONNAME"],
        }
    }

    /// Prefix of the statistic column names.
    pub fn prefix(&self) -> &'static str {
        match self {
            ZoneKind::Census => "CUSEC",
            ZoneKind::Marketing => "ID",
        }
    }

    /// `{prefix}_{stat}` names in output order.
    pub fn stat_column_names(&self) -> Vec<String> {
        STAT_COLUMNS
            .iter()
            .map(|stat| format!("{}_{stat}", self.prefix()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_column_names() {
        let names = ZoneKind::Marketing.stat_column_names();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "ID_PRICE_median");
        assert_eq!(names[5], "ID_UNITPRICE_count");
        assert_eq!(ZoneKind::Census.stat_column_names()[6], "CUSEC_UNITPRICE_std");
    }
}
