pub mod graphql;
pub mod types;

pub use graphql::{fiction_query, FictionConnection, FictionFilterInput, FictionNode, FictionOrderInput};
pub use types::{
    AnswerInput, ExportRow, FictionData, FictionInput, ImportInput, MergeInput, SplitInput,
};
