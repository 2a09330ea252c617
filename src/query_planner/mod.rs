pub mod combinators;
pub mod elaborator;
pub mod operator;
pub mod predicate;

pub use elaborator::{
    errors::{ArgumentProblem, ElaborationError, ElaborationErrors},
    operation::{Operation, OperationKind},
    Elaborator,
};
pub use operator::{Operator, OrderItem, SortDirection};
pub use predicate::{FieldPath, Predicate};
