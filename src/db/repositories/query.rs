//! Translation of [`Query`] predicates into sea-orm conditions.

use crate::backend::{BackendError, Filter, Query};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    Condition, ConnectionTrait, EntityName, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::str::FromStr;

pub fn column<E>(name: &str) -> Result<E::Column, BackendError>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    E::Column::from_str(name).map_err(|_| {
        BackendError::InvalidQuery(format!(
            "unknown column '{name}' on {}",
            E::default().table_name()
        ))
    })
}

fn column_expr<E>(name: &str) -> Result<Expr, BackendError>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    Ok(Expr::col((E::default(), column::<E>(name)?)))
}

pub fn condition<E>(filters: &[Filter]) -> Result<Condition, BackendError>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    filters
        .iter()
        .try_fold(Condition::all(), |cond, filter| {
            Ok(cond.add(filter_condition::<E>(filter)?))
        })
}

fn filter_condition<E>(filter: &Filter) -> Result<Condition, BackendError>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    let condition = match filter {
        Filter::Eq(name, value) => {
            Condition::all().add(column_expr::<E>(name)?.eq(sea_orm::Value::from(value.clone())))
        }
        Filter::In(name, values) => Condition::all().add(
            column_expr::<E>(name)?.is_in(values.iter().cloned().map(sea_orm::Value::from)),
        ),
        // LOWER(col) LIKE lower(pattern) behaves like ILIKE on every backend.
        Filter::ILike(name, pattern) => Condition::all().add(
            Expr::expr(Func::lower(column_expr::<E>(name)?)).like(pattern.to_lowercase()),
        ),
        Filter::Or(any_of) => any_of
            .iter()
            .try_fold(Condition::any(), |cond, inner| {
                Ok::<_, BackendError>(cond.add(filter_condition::<E>(inner)?))
            })?,
    };

    Ok(condition)
}

/// Runs `query` against `E`, ordering by `default_order` when the query has no order.
pub async fn select<E, C>(
    conn: &C,
    query: &Query,
    default_order: &str,
) -> Result<Vec<E::Model>, BackendError>
where
    E: EntityTrait,
    E::Column: FromStr,
    C: ConnectionTrait,
{
    let mut select = E::find().filter(condition::<E>(query.filters())?);

    let (order_column, ascending) = query
        .order()
        .map_or((default_order, true), |o| (o.column, o.ascending));
    let order = if ascending { Order::Asc } else { Order::Desc };
    select = select.order_by(column::<E>(order_column)?, order);

    if let Some(limit) = query.row_limit() {
        select = select.limit(limit);
    }

    Ok(select.all(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::products;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn unknown_columns_are_rejected() {
        let err = column::<products::Entity>("colour").unwrap_err();
        assert!(matches!(err, BackendError::InvalidQuery(_)));
    }

    #[test]
    fn filters_render_to_sql() {
        let query = Query::new()
            .eq("category_id", 2)
            .or(vec![
                Filter::contains("title", "AGM"),
                Filter::contains("rating_unit", "ah"),
            ]);

        let cond = condition::<products::Entity>(query.filters()).unwrap();
        let sql = products::Entity::find()
            .filter(cond)
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("\"products\".\"category_id\" = 2"));
        assert!(sql.contains("LOWER(\"products\".\"title\") LIKE '%agm%'"));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let query = Query::new().is_in("id", Vec::<i32>::new());
        let cond = condition::<products::Entity>(query.filters()).unwrap();
        let sql = products::Entity::find()
            .filter(cond)
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("1 = 2"));
    }
}
