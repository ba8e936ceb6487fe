//! Criteria builder: turns an [`OrderSearch`] into a predicate.
//!
//! Member names are matched as a case-sensitive substring, the behaviour of
//! `LIKE '%name%'` with wildcards in the input taken literally.

use jpashop_proto::{OrderSearch, OrderStatus, Pagination};

use crate::model::{Member, Order};

/// Upper bound on root orders returned by any query.
pub const MAX_RESULTS: usize = 1000;

/// Filter applied by the query engine to root orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPredicate {
    /// Exact status match.
    pub status: Option<OrderStatus>,
    /// Text the buyer's name must contain.
    pub name_contains: Option<String>,
    /// Maximum number of root orders.
    pub max_results: usize,
}

impl OrderPredicate {
    /// A predicate with no constraints, capped at [`MAX_RESULTS`].
    pub fn unconstrained() -> Self {
        Self {
            status: None,
            name_contains: None,
            max_results: MAX_RESULTS,
        }
    }

    /// Rows to skip and rows to take for a window over matching orders.
    ///
    /// The cap counts from the first matching order, so no window reaches
    /// past the `max_results`-th order whatever its offset.
    pub fn window(&self, pagination: Option<Pagination>) -> (usize, usize) {
        match pagination {
            Some(page) => {
                let skip = page.offset as usize;
                (skip, (page.limit as usize).min(self.max_results.saturating_sub(skip)))
            }
            None => (0, self.max_results),
        }
    }

    /// Whether `order` bought by `member` satisfies this predicate.
    pub fn matches(&self, order: &Order, member: &Member) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        match &self.name_contains {
            Some(needle) => member.name.contains(needle.as_str()),
            None => true,
        }
    }
}

/// Builds [`OrderPredicate`]s with a fixed result cap.
#[derive(Debug, Clone, Copy)]
pub struct CriteriaBuilder {
    max_results: usize,
}

impl Default for CriteriaBuilder {
    fn default() -> Self {
        Self::new(MAX_RESULTS)
    }
}

impl CriteriaBuilder {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    /// Translate search criteria into a predicate.
    ///
    /// A name filter that is empty or only whitespace counts as absent.
    pub fn build(&self, search: &OrderSearch) -> OrderPredicate {
        let name_contains = search
            .member_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_owned);

        OrderPredicate {
            status: search.status,
            name_contains,
            max_results: self.max_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: 1,
            member_id: 1,
            delivery_id: 1,
            order_date: 0,
            status,
        }
    }

    fn member(name: &str) -> Member {
        Member {
            id: 1,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_empty_search_has_no_constraints() {
        let predicate = CriteriaBuilder::default().build(&OrderSearch::all());

        assert_eq!(predicate, OrderPredicate::unconstrained());
        assert!(predicate.matches(&order(OrderStatus::Cancel), &member("anyone")));
    }

    #[test]
    fn test_status_is_exact() {
        let predicate =
            CriteriaBuilder::default().build(&OrderSearch::all().with_status(OrderStatus::Order));

        assert!(predicate.matches(&order(OrderStatus::Order), &member("userA")));
        assert!(!predicate.matches(&order(OrderStatus::Cancel), &member("userA")));
    }

    #[test]
    fn test_name_is_case_sensitive_substring() {
        let predicate = CriteriaBuilder::default().build(&OrderSearch::all().with_member_name("ser"));

        assert_eq!(predicate.name_contains.as_deref(), Some("ser"));
        assert!(predicate.matches(&order(OrderStatus::Order), &member("userA")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("USERA")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("kim")));
    }

    #[test]
    fn test_blank_name_is_absent() {
        let predicate = CriteriaBuilder::default().build(&OrderSearch::all().with_member_name("  "));
        assert_eq!(predicate.name_contains, None);
    }

    #[test]
    fn test_both_filters_combine() {
        let search = OrderSearch::all()
            .with_status(OrderStatus::Cancel)
            .with_member_name("B");
        let predicate = CriteriaBuilder::default().build(&search);

        assert!(predicate.matches(&order(OrderStatus::Cancel), &member("userB")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("userB")));
        assert!(!predicate.matches(&order(OrderStatus::Cancel), &member("userA")));
    }

    #[test]
    fn test_wildcards_in_name_are_literal() {
        let predicate = CriteriaBuilder::default().build(&OrderSearch::all().with_member_name("a_b"));

        assert!(predicate.matches(&order(OrderStatus::Order), &member("xa_by")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("axb")));

        let predicate = CriteriaBuilder::default().build(&OrderSearch::all().with_member_name("100%"));
        assert!(predicate.matches(&order(OrderStatus::Order), &member("100%")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("1000")));

        let predicate = CriteriaBuilder::default().build(&OrderSearch::all().with_member_name("a\\b"));
        assert!(predicate.matches(&order(OrderStatus::Order), &member("xa\\b")));
        assert!(!predicate.matches(&order(OrderStatus::Order), &member("ab")));
    }

    #[test]
    fn test_window_stops_at_cap() {
        let predicate = CriteriaBuilder::new(5).build(&OrderSearch::all());

        assert_eq!(predicate.window(None), (0, 5));
        assert_eq!(predicate.window(Some(Pagination::new(100, 0))), (0, 5));
        assert_eq!(predicate.window(Some(Pagination::new(3, 1))), (1, 3));
        assert_eq!(predicate.window(Some(Pagination::new(5, 3))), (3, 2));
        assert_eq!(predicate.window(Some(Pagination::new(5, 5))), (5, 0));
        assert_eq!(predicate.window(Some(Pagination::new(5, 50))), (50, 0));
    }

    #[test]
    fn test_custom_cap() {
        let predicate = CriteriaBuilder::new(5).build(&OrderSearch::all());
        assert_eq!(predicate.max_results, 5);
    }
}
