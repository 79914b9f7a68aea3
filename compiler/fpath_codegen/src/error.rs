use fpath_ir::Span;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("expression nests deeper than the limit of {max} levels")]
    TooDeep { max: usize, span: Span },
}

impl CodegenError {
    pub fn span(&self) -> Span {
        match self {
            CodegenError::TooDeep { span, .. } => *span,
        }
    }
}
