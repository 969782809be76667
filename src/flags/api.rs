use crate::flags::context::EvaluationContext;
use crate::flags::model::EvaluationDetail;

/// Answers boolean flag queries.
///
/// Implementations are shared by every in-flight request and must never
/// fail: anything that goes wrong yields `default` and an error reason.
pub trait FlagEvaluator: Send + Sync {
    fn bool_variation_detail(
        &self,
        key: &str,
        context: &EvaluationContext,
        default: bool,
    ) -> EvaluationDetail;

    fn bool_variation(&self, key: &str, context: &EvaluationContext, default: bool) -> bool {
        self.bool_variation_detail(key, context, default).value
    }

    /// Whether flag data has been received at least once.
    fn initialized(&self) -> bool;
}
