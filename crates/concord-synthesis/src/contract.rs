//! Built-in strategies for contract proposals

use crate::error::MergeConflict;
use crate::strategy::{Merger, QualityScorer};
use concord_contract::{Contract, Operation, Schema};

/// Scores how completely a contract documents its endpoints
///
/// Per operation: a point for a response body with fields, a point for a
/// request body with fields where the method carries one, and a fraction
/// of a point per documented top-level field. Each path whose literal
/// segments are lower-case earns half a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractCompletenessScorer;

impl ContractCompletenessScorer {
    const BODY_WEIGHT: f64 = 1.0;
    const FIELD_WEIGHT: f64 = 0.1;
    const PATH_STYLE_WEIGHT: f64 = 0.5;

    fn documented(schema: Option<&Schema>) -> usize {
        schema.map_or(0, |s| s.properties.len())
    }

    fn score_operation(method_has_body: bool, op: &Operation) -> f64 {
        let request_fields = Self::documented(op.request_schema());
        let response_fields: usize = op
            .responses
            .values()
            .map(|r| Self::documented(r.schema()))
            .sum();

        let mut score = 0.0;
        if response_fields > 0 {
            score += Self::BODY_WEIGHT;
        }
        if method_has_body && request_fields > 0 {
            score += Self::BODY_WEIGHT;
        }
        score + Self::FIELD_WEIGHT * (request_fields + response_fields) as f64
    }

    fn conventional_path(path: &str) -> bool {
        path.split('/')
            .filter(|seg| !seg.starts_with('{'))
            .all(|seg| !seg.chars().any(|c| c.is_ascii_uppercase()))
    }
}

impl QualityScorer<Contract> for ContractCompletenessScorer {
    fn score(&self, contract: &Contract) -> f64 {
        let operations: f64 = contract
            .operations()
            .map(|(_, method, op)| Self::score_operation(method.has_request_body(), op))
            .sum();
        let paths = contract
            .paths
            .keys()
            .filter(|p| Self::conventional_path(p))
            .count();
        operations + Self::PATH_STYLE_WEIGHT * paths as f64
    }

    fn name(&self) -> &str {
        "contract_completeness"
    }
}

/// Unions the endpoints of every candidate contract
///
/// Metadata comes from the first candidate. The same (path, method) in two
/// candidates must carry equal operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractUnionMerger;

impl Merger<Contract> for ContractUnionMerger {
    fn merge(&self, candidates: &[&Contract]) -> Result<Contract, MergeConflict> {
        let Some((first, rest)) = candidates.split_first() else {
            return Err(MergeConflict::new("no candidates"));
        };
        let mut merged = (*first).clone();
        for candidate in rest {
            for (path, method, op) in candidate.operations() {
                match merged.operation(path, method) {
                    Some(existing) if existing != op => {
                        return Err(MergeConflict::new(format!(
                            "{method} {path} differs between candidates"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        merged.insert_operation(path, method, op.clone());
                    }
                }
            }
        }
        Ok(merged)
    }

    fn name(&self) -> &str {
        "contract_union"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::{Proposal, SynthesisRule};
    use crate::synthesizer::ProposalSynthesizer;
    use concord_contract::{FieldSpec, FieldType, HttpMethod, SchemaSpec};

    fn user_schema() -> Schema {
        SchemaSpec::new(vec![
            FieldSpec::required("id", FieldType::Integer),
            FieldSpec::required("email", FieldType::String),
        ])
        .to_schema()
    }

    fn bare() -> Contract {
        let mut c = Contract::new("api", "1");
        c.insert_operation(
            "/users",
            HttpMethod::Post,
            Operation::new()
                .with_request(Schema::object())
                .with_response("200", Schema::object()),
        );
        c
    }

    fn documented() -> Contract {
        let mut c = Contract::new("api", "1");
        c.insert_operation(
            "/users",
            HttpMethod::Post,
            Operation::new()
                .with_request(user_schema())
                .with_response("200", user_schema()),
        );
        c
    }

    #[test]
    fn documented_contract_scores_higher() {
        let scorer = ContractCompletenessScorer;
        let bare = scorer.score(&bare());
        let full = scorer.score(&documented());
        assert!((bare - 0.5).abs() < 1e-9, "{bare}");
        assert!((full - 2.9).abs() < 1e-9, "{full}");
    }

    #[test]
    fn path_convention() {
        assert!(ContractCompletenessScorer::conventional_path("/users/{userId}"));
        assert!(!ContractCompletenessScorer::conventional_path("/Users"));
    }

    #[test]
    fn union_of_disjoint_contracts() {
        let mut other = Contract::new("other", "2");
        other.insert_operation(
            "/health",
            HttpMethod::Get,
            Operation::new().with_response("200", Schema::object()),
        );
        let merged = ContractUnionMerger.merge(&[&documented(), &other]).unwrap();
        assert_eq!(merged.endpoint_count(), 2);
        assert_eq!(merged.info.title, "api");
    }

    #[test]
    fn union_conflict_on_same_slot() {
        let err = ContractUnionMerger
            .merge(&[&documented(), &bare()])
            .unwrap_err();
        assert!(err.to_string().contains("POST /users"));
        assert!(ContractUnionMerger.merge(&[&bare(), &bare()]).is_ok());
    }

    #[test]
    fn required_order_still_unanimous() {
        let mut reordered = documented();
        let op = reordered.operation_mut("/users", HttpMethod::Post).unwrap();
        let body = op.request_body.as_mut().unwrap();
        body.content
            .get_mut("application/json")
            .unwrap()
            .schema
            .required
            .reverse();

        let result = ProposalSynthesizer::default()
            .synthesize(&[
                Proposal::new("backend", documented(), 0.8, "").unwrap(),
                Proposal::new("frontend", reordered, 0.7, "").unwrap(),
            ])
            .unwrap();
        assert_eq!(result.rule(), SynthesisRule::Unanimous);
    }
}
