use std::collections::BTreeMap;

use serde::Serialize;

use super::TransactionKind;

pub trait Grouped {
    fn kind(&self) -> TransactionKind;
}

impl<T: Grouped> Grouped for &T {
    fn kind(&self) -> TransactionKind {
        T::kind(*self)
    }
}

/// Transactions split by their type. Order within each group matches the input order.
#[derive(Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransactionGroups<T> {
    groups: BTreeMap<TransactionKind, Vec<T>>,
}

impl<T> TransactionGroups<T> {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, kind: TransactionKind) -> &[T] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransactionKind, &[T])> {
        self.groups.iter().map(|(&kind, items)| (kind, items.as_slice()))
    }
}

pub fn group<T, I>(items: I) -> TransactionGroups<T>
    where T: Grouped, I: IntoIterator<Item = T>
{
    let mut groups: BTreeMap<TransactionKind, Vec<T>> = BTreeMap::new();

    for item in items {
        groups.entry(item.kind()).or_default().push(item);
    }

    TransactionGroups {groups}
}
