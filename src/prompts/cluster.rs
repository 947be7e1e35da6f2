//! Cluster request prompt.
//!
//! One prompt per criterion. It embeds the criterion definition, the full
//! failure set, the closed list of failure IDs, near-fail evidence, product
//! context and the generation system prompt, then asks for a fixed schema.

use crate::clusters::NO_EXPLANATION;
use crate::error::EngineError;
use crate::evaluation::{CriterionDefinition, EvidenceSet, ExplanationMode};

/// Inputs for [`cluster_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Criterion being clustered.
    pub criterion: &'a str,
    /// Catalog entry; rendered as `{}` when absent.
    pub definition: Option<&'a CriterionDefinition>,
    /// Failures and near-fails.
    pub evidence: &'a EvidenceSet,
    /// Product context document.
    pub product_context: &'a str,
    /// System prompt used for the original generation.
    pub system_prompt: &'a str,
}

const SCHEMA_TEMPLATE: &str = r#"{
  "criterion": __CRITERION__,
  "failures": __FAILURES__,
  "clusters": [
    {
      "cluster_name": "short, specific",
      "severity": "High|Medium|Low",
      "root_cause": "prompt|data|eval|model|mixed",
      "pattern": "what is happening, grounded in judge explanations",
      "explanation_anchor": "quote or summary of the judge explanation pattern that defines this cluster",
      "why_it_matters": "tie explicitly to the product intent described in the feature context",
      "failure_execution_ids": [12, 15],
      "examples": [
        {
          "execution_id": 12,
          "example_type": "failure|near_fail",
          "output_full": "full output text",
          "explanation_excerpt": "quote or paraphrase from judge explanation (or: \"__SENTINEL__\")",
          "issue_note": "1-2 sentence explanation of the issue"
        }
      ],
      "recommendation": {
        "type": "prompt|data|eval|model",
        "action": "specific change, ideally exact prompt/eval text",
        "risk": "possible side effect or trade-off"
      }
    }
  ],
  "no_issue_note": "only if failures == 0"
}"#;

/// Instruction line selected by explanation availability.
#[must_use]
pub fn explanation_note(mode: ExplanationMode) -> String {
    match mode {
        ExplanationMode::WithExplanations => {
            "Explanations are available. Use them as primary evidence.".to_string()
        }
        ExplanationMode::WithoutExplanations => format!(
            "No judge explanations are available. Use \"{NO_EXPLANATION}\" for explanation_anchor and explanation_excerpt."
        ),
    }
}

/// Build the cluster request prompt for one criterion.
///
/// # Errors
///
/// Returns [`EngineError::Serialization`] if the evidence cannot be
/// rendered as JSON.
pub fn cluster_prompt(ctx: &PromptContext<'_>) -> Result<String, EngineError> {
    let definition_json = match ctx.definition {
        Some(definition) => to_pretty(definition)?,
        None => "{}".to_string(),
    };
    let failures_json = to_pretty(ctx.evidence.failures())?;
    let near_fails_json = to_pretty(ctx.evidence.near_fails())?;
    let failure_ids = ctx
        .evidence
        .failure_ids()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let criterion_literal = serde_json::to_string(ctx.criterion).map_err(serialization)?;

    let schema = SCHEMA_TEMPLATE
        .replace("__CRITERION__", &criterion_literal)
        .replace("__FAILURES__", &ctx.evidence.failures().len().to_string())
        .replace("__SENTINEL__", NO_EXPLANATION);

    let note = explanation_note(ctx.evidence.explanation_mode());

    Ok(format!(
        r#"You are producing a structured meta-analysis for a single evaluation criterion.

Use the feature context and prompt rules to judge why issues matter, not just what the judge said.
Judge explanations are the primary evidence; scores only provide pass/fail context.
{note}

## Feature context
{product_context}

## System prompt (generation)
{system_prompt}

## Eval criterion definition (Evals.json entry)
{definition_json}

## Failures (must be clustered)
{failures_json}

## Failure IDs (must all be assigned exactly once)
[{failure_ids}]

## Near-fails (optional evidence)
{near_fails_json}

Required output: JSON only, with this schema:
{schema}

Rules:
- Cluster ALL failures (each failure belongs to exactly one cluster).
- Use exactly 3 examples per cluster when possible. If fewer than 3 failures exist, use near-fails to reach 3; otherwise use as many as exist.
- Rank clusters by priority: severity first, then prevalence, then product risk.
- Do not invent data not present in failures/near-fails.
- Do NOT use placeholder text like "short, specific" or "what is happening".
- Focus on judge explanations more than scores; scores are for pass/fail context only.
- Output examples must include the FULL output text (not excerpts).
- If a judge explanation is missing/empty, set explanation_excerpt to: "{NO_EXPLANATION}""#,
        product_context = ctx.product_context.trim(),
        system_prompt = ctx.system_prompt.trim(),
    ))
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, EngineError> {
    serde_json::to_string_pretty(value).map_err(serialization)
}

fn serialization(e: serde_json::Error) -> EngineError {
    EngineError::Serialization {
        message: e.to_string(),
    }
}
