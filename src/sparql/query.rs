//! SELECT query text for batched Wikidata lookups.
//!
//! Every pair or entity gets its own numbered variable inside its own group,
//! and the groups are joined with `UNION`. A row binds exactly one variable,
//! so the result size is the sum of the matches rather than their product,
//! and a missing answer never hides the others.

use crate::entity::EntityId;
use crate::metadata::MetadataKind;

const PREFIXES: &str = "PREFIX wikibase: <http://wikiba.se/ontology#>
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX schema: <http://schema.org/>
PREFIX owl: <http://www.w3.org/2002/07/owl#>
";

/// Variable prefix used for relation queries (`?r0`, `?r1`, ...).
pub const RELATION_VAR: &str = "r";

/// Variable prefix for a metadata kind (`?l0`, `?d0`, `?s0`, ...).
pub fn metadata_var(kind: MetadataKind) -> &'static str {
    match kind {
        MetadataKind::Label => "l",
        MetadataKind::Description => "d",
        MetadataKind::Redirection => "s",
    }
}

fn select(var: &str, count: usize, groups: Vec<String>) -> String {
    let vars: Vec<String> = (0..count).map(|i| format!("?{}{}", var, i)).collect();
    format!(
        "{}\nSELECT {}\nWHERE\n{{\n{}\n}}\n",
        PREFIXES,
        vars.join(" "),
        groups.join("\n  UNION\n")
    )
}

/// One variable per (head, tail) pair: `{ wd:h ?r{i} wd:t . }`.
pub fn relations_query(heads: &[EntityId], tails: &[EntityId]) -> String {
    let groups = heads
        .iter()
        .zip(tails)
        .enumerate()
        .map(|(i, (h, t))| format!("  {{ wd:{} ?{}{} wd:{} . }}", h, RELATION_VAR, i, t))
        .collect();
    select(RELATION_VAR, heads.len(), groups)
}

/// One variable per entity for labels, descriptions or redirections.
///
/// Labels and descriptions match the `en` language tag exactly; regional
/// variants such as `en-gb` are not returned.
pub fn metadata_query(kind: MetadataKind, entities: &[EntityId]) -> String {
    let var = metadata_var(kind);
    let groups = entities
        .iter()
        .enumerate()
        .map(|(i, e)| match kind {
            MetadataKind::Label => format!(
                "  {{ wd:{e} rdfs:label ?{var}{i} .\n    FILTER (lang(?{var}{i}) = \"en\") }}"
            ),
            MetadataKind::Description => format!(
                "  {{ wd:{e} schema:description ?{var}{i} .\n    FILTER (lang(?{var}{i}) = \"en\") }}"
            ),
            MetadataKind::Redirection => format!("  {{ wd:{e} owl:sameAs ?{var}{i} . }}"),
        })
        .collect();
    select(var, entities.len(), groups)
}
