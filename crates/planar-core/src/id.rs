use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide interner shared by every store.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter backing generated IDs.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Separator between the instance and descendant parts of a path ID.
pub const PATH_SEPARATOR: char = '/';

/// Node identifier. A 4-byte `Spur` into the interner, so ids are `Copy`
/// and compare by integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Spur);

impl NodeId {
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate an ID with a type prefix (e.g. `rect_1`, `frame_2`).
    ///
    /// Unique within the process. The store still checks the document for
    /// collisions since pasted or restored nodes may carry arbitrary names.
    pub fn with_prefix(prefix: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }

    /// Path ID for a descendant rendered inside an instance: `instance/descendant`.
    pub fn path(instance: NodeId, descendant: NodeId) -> Self {
        Self::intern(&format!(
            "{}{PATH_SEPARATOR}{}",
            instance.as_str(),
            descendant.as_str()
        ))
    }

    /// True for ids that name a descendant inside an instance.
    pub fn is_path(&self) -> bool {
        self.as_str().contains(PATH_SEPARATOR)
    }

    /// Split a path ID into its instance prefix and the last segment.
    /// Returns `None` for plain (non-path) IDs.
    pub fn split_path(&self) -> Option<(NodeId, NodeId)> {
        let s = self.as_str();
        let (head, tail) = s.rsplit_once(PATH_SEPARATOR)?;
        Some((NodeId::intern(head), NodeId::intern(tail)))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}
