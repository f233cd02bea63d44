use xi_rope::Rope;

use crate::error::EngineError;
use crate::parsing::blocks::BlockNode;

/// Structural invariant checks grounding the fatal `invariant-violation`
/// error category: every span must be in bounds, and every block's content
/// view must resolve to spans contained within the block's own span. Returns
/// the first violation found rather than panicking, so a production caller
/// can turn it into a `RESET` instead of taking down the process.
pub fn check(rope: &Rope, blocks: &[BlockNode]) -> Result<(), EngineError> {
    let n = rope.len();
    for b in blocks {
        if !(b.span.start <= b.span.end && b.span.end <= n) {
            return Err(EngineError::InvariantViolation {
                message: format!("block span out of bounds: {:?} (rope len: {n})", b.span),
            });
        }
        for span in b.content.spans() {
            if !(span.start <= span.end && span.end <= n) {
                return Err(EngineError::InvariantViolation {
                    message: format!("content span out of bounds: {span:?} (rope len: {n})"),
                });
            }
            if !(span.start >= b.span.start && span.end <= b.span.end) {
                return Err(EngineError::InvariantViolation {
                    message: format!("content span not contained in block span: content {span:?}, block {:?}", b.span),
                });
            }
        }
    }
    Ok(())
}
