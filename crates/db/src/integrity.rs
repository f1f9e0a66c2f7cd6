//! Live-data invariant checks.
//!
//! Most invariants are enforced by constraints, but the order arithmetic
//! (`line_total = quantity * unit_price`, `subtotal = sum(line totals)`,
//! `total = subtotal + tax + shipping`) is not. Each rule below is a query
//! returning one `detail` row per offending record; an empty result means the
//! rule holds.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument, warn};

use crate::error::RepositoryError;

/// A named invariant and the query that finds rows breaking it.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    sql: &'static str,
}

/// One record that breaks a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: &'static str,
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.detail)
    }
}

/// Every rule evaluated by [`check`].
pub const RULES: &[Rule] = &[
    Rule {
        name: "negative_product_price",
        sql: "SELECT format('product %s has price_cents %s', id, price_cents) AS detail \
              FROM products WHERE price_cents < 0 ORDER BY id",
    },
    Rule {
        name: "negative_cart_item_money",
        sql: "SELECT format('cart item %s has unit_price_cents %s', id, unit_price_cents) AS detail \
              FROM cart_items WHERE unit_price_cents < 0 ORDER BY id",
    },
    Rule {
        name: "negative_order_item_money",
        sql: "SELECT format('order item %s has unit_price_cents %s, line_total_cents %s', \
                     id, unit_price_cents, line_total_cents) AS detail \
              FROM order_items WHERE unit_price_cents < 0 OR line_total_cents < 0 ORDER BY id",
    },
    Rule {
        name: "negative_order_money",
        sql: "SELECT format('order %s has subtotal %s, tax %s, shipping %s, total %s', \
                     id, subtotal_cents, tax_cents, shipping_cents, total_cents) AS detail \
              FROM orders \
              WHERE subtotal_cents < 0 OR tax_cents < 0 OR shipping_cents < 0 OR total_cents < 0 \
              ORDER BY id",
    },
    Rule {
        name: "non_positive_quantity",
        sql: "SELECT format('cart item %s has quantity %s', id, quantity) AS detail \
              FROM cart_items WHERE quantity <= 0 \
              UNION ALL \
              SELECT format('order item %s has quantity %s', id, quantity) \
              FROM order_items WHERE quantity <= 0 \
              ORDER BY 1",
    },
    Rule {
        name: "duplicate_cart_status",
        sql: "SELECT format('user %s has %s %s carts', user_id, count(*), status) AS detail \
              FROM carts GROUP BY user_id, status HAVING count(*) > 1 ORDER BY user_id",
    },
    Rule {
        name: "duplicate_cart_product",
        sql: "SELECT format('cart %s lists product %s %s times', cart_id, product_id, count(*)) AS detail \
              FROM cart_items GROUP BY cart_id, product_id HAVING count(*) > 1 ORDER BY cart_id",
    },
    Rule {
        name: "duplicate_order_product",
        sql: "SELECT format('order %s lists product %s %s times', order_id, product_id, count(*)) AS detail \
              FROM order_items GROUP BY order_id, product_id HAVING count(*) > 1 ORDER BY order_id",
    },
    Rule {
        name: "line_total_mismatch",
        sql: "SELECT format('order item %s: line_total_cents %s != %s x %s', \
                     id, line_total_cents, quantity, unit_price_cents) AS detail \
              FROM order_items \
              WHERE line_total_cents::BIGINT <> quantity::BIGINT * unit_price_cents::BIGINT \
              ORDER BY id",
    },
    Rule {
        name: "subtotal_mismatch",
        sql: "SELECT format('order %s: subtotal_cents %s != sum of line totals %s', \
                     o.id, o.subtotal_cents, coalesce(s.line_sum, 0)) AS detail \
              FROM orders o \
              LEFT JOIN ( \
                  SELECT order_id, sum(line_total_cents::BIGINT) AS line_sum \
                  FROM order_items GROUP BY order_id \
              ) s ON s.order_id = o.id \
              WHERE o.subtotal_cents::BIGINT <> coalesce(s.line_sum, 0) \
              ORDER BY o.id",
    },
    Rule {
        name: "total_mismatch",
        sql: "SELECT format('order %s: total_cents %s != %s + %s + %s', \
                     id, total_cents, subtotal_cents, tax_cents, shipping_cents) AS detail \
              FROM orders \
              WHERE total_cents::BIGINT \
                    <> subtotal_cents::BIGINT + tax_cents::BIGINT + shipping_cents::BIGINT \
              ORDER BY id",
    },
];

/// Evaluate every rule against the current data.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a connection cannot be acquired or
/// any rule query fails.
#[instrument(skip(pool))]
pub async fn check(pool: &PgPool) -> Result<Vec<Violation>, RepositoryError> {
    let mut conn = pool.acquire().await?;
    check_on(&mut conn).await
}

/// Evaluate every rule on one connection.
///
/// Inside a transaction this sees uncommitted rows, including duplicates
/// admitted by a deferred constraint.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any rule query fails.
pub async fn check_on(conn: &mut PgConnection) -> Result<Vec<Violation>, RepositoryError> {
    let mut violations = Vec::new();

    for rule in RULES {
        let details: Vec<(String,)> = sqlx::query_as(rule.sql).fetch_all(&mut *conn).await?;
        debug!(rule = rule.name, found = details.len(), "Evaluated rule");

        violations.extend(details.into_iter().map(|(detail,)| Violation {
            rule: rule.name,
            detail,
        }));
    }

    if violations.is_empty() {
        info!(rules = RULES.len(), "All integrity rules hold");
    } else {
        warn!(count = violations.len(), "Integrity violations found");
    }
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_rule_names_unique() {
        let names: HashSet<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn test_rules_select_detail_column() {
        for rule in RULES {
            assert!(rule.sql.starts_with("SELECT format("), "{}", rule.name);
            assert!(rule.sql.contains("AS detail"), "{}", rule.name);
        }
    }

    #[test]
    fn test_rules_report_in_stable_order() {
        for rule in RULES {
            assert!(rule.sql.contains("ORDER BY"), "{}", rule.name);
        }
    }

    #[test]
    fn test_arithmetic_rules_widen_before_comparing() {
        for name in ["line_total_mismatch", "subtotal_mismatch", "total_mismatch"] {
            let rule = RULES.iter().find(|r| r.name == name);
            assert!(rule.is_some_and(|r| r.sql.contains("::BIGINT")), "{name}");
        }
    }

    #[test]
    fn test_violation_display() {
        let v = Violation {
            rule: "total_mismatch",
            detail: "order 1: total_cents 5 != 1 + 1 + 1".to_string(),
        };
        assert_eq!(v.to_string(), "[total_mismatch] order 1: total_cents 5 != 1 + 1 + 1");
    }
}
