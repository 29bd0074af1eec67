//! Error taxonomy shared by every entity store port.

use super::define_port_error;

define_port_error! {
    /// Failures surfaced by entity store adapters.
    ///
    /// Adapters classify driver errors into these variants; nothing is
    /// swallowed and nothing is retried at this layer.
    pub enum StoreError {
        /// No row matched the identifier.
        NotFound { entity: String } => "{entity} not found",
        /// A unique constraint rejected the write.
        Conflict { constraint: String } => "conflicting record: {constraint}",
        /// The conditional update lost to a concurrent writer.
        VersionMismatch { expected: u32, actual: u32 } =>
            "version mismatch: expected {expected}, found {actual}",
        /// Local validation or a check constraint rejected the data.
        InvalidData { message: String } => "invalid data: {message}",
        /// A foreign key pointed at a missing row.
        InvalidReference { message: String } => "invalid reference: {message}",
        /// The operation exceeded its deadline.
        Timeout { operation: String } => "{operation} timed out",
        /// The operation was cancelled before completing.
        Canceled { operation: String } => "{operation} was canceled",
        /// The store could not be reached.
        Connection { message: String } => "store connection failed: {message}",
        /// Any other query failure.
        Query { message: String } => "store query failed: {message}",
    }
}
