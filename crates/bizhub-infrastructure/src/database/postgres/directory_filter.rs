//! WHERE clause shared by the directory tables

use bizhub_core::domain::DirectoryFilter;
use bizhub_shared::utils::search_pattern;
use sqlx::{Postgres, QueryBuilder};

/// Appends the active flag and a case-insensitive name search.
pub(crate) fn push_directory_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &DirectoryFilter) {
    qb.push(" WHERE TRUE");
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        qb.push(" AND name ILIKE ").push_bind(pattern);
    }
}
