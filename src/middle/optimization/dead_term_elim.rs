use super::{
    OptId, Pass,
    canvas::{Canvas, Transform},
};

/// Removes definitions nobody reads.
///
/// Operands freed by a removal are only noticed by the next traversal, so a
/// chain of dead definitions needs as many traversals as it is long.
pub struct DeadTermElim;

impl Pass for DeadTermElim {
    fn id(&self) -> OptId {
        OptId::DeadTermElim
    }

    fn apply(&self, canvas: Canvas) -> Canvas {
        canvas.each_op(|_, data, op| {
            if op.is_definition() && data.uses_of(op.term()).is_empty() {
                Transform::remove(op)
            } else {
                Transform::Retain
            }
        })
    }
}
