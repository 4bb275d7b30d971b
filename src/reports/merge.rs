//! Merging per-file contributions into category-wide buckets
//!
//! Counts and sums add up across files. Distinct users do not: the customer
//! code sets are unioned so that a customer seen in several files counts once.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use super::file_summary::{FileContribution, QuantityOverflow};
use super::Totals;
use crate::importers::Record;

/// Accumulated state of one aggregation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBucket {
    customers: HashSet<String>,
    pub files: usize,
    pub orders: u64,
    pub sales: Decimal,
    pub by_year: BTreeMap<String, Decimal>,
    pub by_group: BTreeMap<String, Decimal>,
    pub rows: Vec<Record>,
}

fn fits_keywise(into: &BTreeMap<String, Decimal>, from: &BTreeMap<String, Decimal>) -> bool {
    from.iter().all(|(key, value)| {
        into.get(key)
            .map_or(true, |current| current.checked_add(*value).is_some())
    })
}

fn add_keywise(into: &mut BTreeMap<String, Decimal>, from: BTreeMap<String, Decimal>) {
    for (key, value) in from {
        *into.entry(key).or_default() += value;
    }
}

impl CategoryBucket {
    /// Merge any number of file contributions.
    ///
    /// A contribution that would overflow a sum is dropped with a warning.
    pub fn merge<I>(contributions: I) -> Self
    where
        I: IntoIterator<Item = FileContribution>,
    {
        let mut bucket = CategoryBucket::default();
        for contribution in contributions {
            if bucket.absorb(contribution).is_err() {
                warn!("Dropping a file whose quantities overflow the category sums");
            }
        }
        bucket
    }

    /// Add one file's contribution; on overflow the bucket is left unchanged
    pub fn absorb(&mut self, contribution: FileContribution) -> Result<(), QuantityOverflow> {
        self.check_fits(contribution.sales, &contribution.by_year, &contribution.by_group)?;
        self.files += 1;
        self.customers.extend(contribution.customers);
        self.orders += contribution.orders;
        self.sales += contribution.sales;
        add_keywise(&mut self.by_year, contribution.by_year);
        add_keywise(&mut self.by_group, contribution.by_group);
        self.rows.extend(contribution.rows);
        Ok(())
    }

    /// Fold another bucket (e.g. the other category) into this one
    pub fn combine(&mut self, other: CategoryBucket) -> Result<(), QuantityOverflow> {
        self.check_fits(other.sales, &other.by_year, &other.by_group)?;
        self.files += other.files;
        self.customers.extend(other.customers);
        self.orders += other.orders;
        self.sales += other.sales;
        add_keywise(&mut self.by_year, other.by_year);
        add_keywise(&mut self.by_group, other.by_group);
        self.rows.extend(other.rows);
        Ok(())
    }

    fn check_fits(
        &self,
        sales: Decimal,
        by_year: &BTreeMap<String, Decimal>,
        by_group: &BTreeMap<String, Decimal>,
    ) -> Result<(), QuantityOverflow> {
        let fits = self.sales.checked_add(sales).is_some()
            && fits_keywise(&self.by_year, by_year)
            && fits_keywise(&self.by_group, by_group);
        if fits {
            Ok(())
        } else {
            Err(QuantityOverflow)
        }
    }

    pub fn user_count(&self) -> u64 {
        self.customers.len() as u64
    }

    pub fn totals(&self) -> Totals {
        Totals {
            total_users: self.user_count(),
            total_orders: self.orders,
            total_sales: self.sales,
        }
    }
}
