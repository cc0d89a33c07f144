//! Lookup tables for the 8-bit IHS conversions.
//!
//! [`IhsTables`] builds each table on first use and keeps it until
//! [`IhsTables::evict`] drops it. Conversions hold an [`Arc`] to the table
//! they read, so evicting while a conversion runs is safe: the running
//! conversion keeps its copy and the next one rebuilds. Rebuilding is
//! deterministic and yields identical tables.
//!
//! | Table  | Entries | Content                                            |
//! |--------|---------|----------------------------------------------------|
//! | `acos` | 1001    | `acos((i - 500) / 500)` scaled to a half byte turn |
//! | `sqrt` | 1001    | `sqrt(i / 1000)`                                   |
//! | `tan`  | 256     | `tan(i * 2pi / 255)`                               |

use std::f64::consts::{PI, TAU};
use std::sync::{Arc, PoisonError, RwLock};

#[allow(unused_imports)]
use tracing::{debug, trace};

/// Arc-cached value built on demand.
#[derive(Debug)]
struct TableSlot<T> {
    name: &'static str,
    value: RwLock<Option<Arc<T>>>,
}

impl<T> TableSlot<T> {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            value: RwLock::new(None),
        }
    }

    fn get_or_build(&self, build: impl FnOnce() -> T) -> Arc<T> {
        if let Some(table) = self.value.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Arc::clone(table);
        }
        let mut slot = self.value.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have built it between the two locks.
        if let Some(table) = slot.as_ref() {
            return Arc::clone(table);
        }
        debug!(table = self.name, "building IHS lookup table");
        let table = Arc::new(build());
        *slot = Some(Arc::clone(&table));
        table
    }

    fn evict(&self) -> bool {
        self.value
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    fn is_built(&self) -> bool {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Arccosine table: `acos(x)` for `x = (i - 500) * 0.002`, mapped so that
/// `[0, pi]` covers `[0, 127.5]` and rounded to the nearest byte.
pub type AcosTable = [u8; 1001];

/// Square roots of `i / 1000`.
pub type SqrtTable = [f64; 1001];

/// Tangents of the 8-bit hue codes, `tan(i * 2pi / 255)`.
pub type TanTable = [f64; 256];

/// Get-or-build cache of the IHS lookup tables.
#[derive(Debug)]
pub struct IhsTables {
    acos: TableSlot<AcosTable>,
    sqrt: TableSlot<SqrtTable>,
    tan: TableSlot<TanTable>,
}

impl Default for IhsTables {
    fn default() -> Self {
        Self::new()
    }
}

impl IhsTables {
    /// Creates an empty cache. Nothing is built until first requested.
    pub const fn new() -> Self {
        Self {
            acos: TableSlot::new("acos"),
            sqrt: TableSlot::new("sqrt"),
            tan: TableSlot::new("tan"),
        }
    }

    /// The arccosine table, building it if needed.
    pub fn acos(&self) -> Arc<AcosTable> {
        self.acos.get_or_build(|| {
            let scale = 127.5 / PI;
            let mut table = [0u8; 1001];
            for (i, v) in table.iter_mut().enumerate() {
                *v = (scale * ((i as f64 - 500.0) * 0.002).acos() + 0.5) as u8;
            }
            table
        })
    }

    /// The square-root table, building it if needed.
    pub fn sqrt(&self) -> Arc<SqrtTable> {
        self.sqrt.get_or_build(|| {
            let mut table = [0.0; 1001];
            for (i, v) in table.iter_mut().enumerate() {
                *v = (i as f64 / 1000.0).sqrt();
            }
            table
        })
    }

    /// The tangent table, building it if needed.
    pub fn tan(&self) -> Arc<TanTable> {
        self.tan.get_or_build(|| {
            let step = TAU / 255.0;
            let mut table = [0.0; 256];
            for (i, v) in table.iter_mut().enumerate() {
                *v = (i as f64 * step).tan();
            }
            table
        })
    }

    /// Drops every cached table. The next request rebuilds it.
    pub fn evict(&self) {
        let dropped = [self.acos.evict(), self.sqrt.evict(), self.tan.evict()];
        let count = dropped.iter().filter(|&&d| d).count();
        debug!(count, "evicted IHS lookup tables");
    }

    /// Number of tables currently cached.
    pub fn built_count(&self) -> usize {
        [self.acos.is_built(), self.sqrt.is_built(), self.tan.is_built()]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lazy_build() {
        let tables = IhsTables::new();
        assert_eq!(tables.built_count(), 0);
        let _ = tables.tan();
        assert_eq!(tables.built_count(), 1);
        let _ = tables.acos();
        let _ = tables.sqrt();
        assert_eq!(tables.built_count(), 3);
    }

    #[test]
    fn test_same_table_is_shared() {
        let tables = IhsTables::new();
        let a = tables.sqrt();
        let b = tables.sqrt();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_evict_and_rebuild_identical() {
        let tables = IhsTables::new();
        let before = tables.acos();
        let tan_before = tables.tan();
        tables.evict();
        assert_eq!(tables.built_count(), 0);

        // Held copies survive eviction.
        assert_eq!(before[500], 64);

        let after = tables.acos();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before[..], after[..]);
        assert_eq!(tan_before[..], tables.tan()[..]);
    }

    #[test]
    fn test_table_contents() {
        let tables = IhsTables::new();
        let acos = tables.acos();
        assert_eq!(acos[1000], 0);
        // 127.5 / PI * acos(-1) lands just below 127.5 and truncates to 127.
        assert_eq!(acos[0], 127);
        assert_eq!(acos[500], 64);

        let sqrt = tables.sqrt();
        assert_eq!(sqrt[0], 0.0);
        assert_eq!(sqrt[1000], 1.0);
        assert_relative_eq!(sqrt[250], 0.5);

        let tan = tables.tan();
        assert_eq!(tan[0], 0.0);
        assert_relative_eq!(tan[85], (TAU / 3.0).tan(), epsilon = 1e-12);
    }

    #[test]
    fn test_concurrent_get_or_build() {
        let tables = Arc::new(IhsTables::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tables = Arc::clone(&tables);
                std::thread::spawn(move || tables.tan()[10])
            })
            .collect();
        let values: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(values.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(tables.built_count(), 1);
    }
}
