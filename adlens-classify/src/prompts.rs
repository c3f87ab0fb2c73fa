//! Prompt builders for the oracle calls.
//!
//! Three distinct shapes: primary classification, relaxed clustering (the
//! fallback, not a retry), and column-mapping suggestion. Category-count
//! hints are fixed defaults with no deeper derivation.

use adlens_core::CanonicalField;

pub const CLASSIFY_SYSTEM: &str =
    "You are a helpful assistant that specializes in keyword analysis for advertising.";
pub const CLUSTER_SYSTEM: &str =
    "You are a keyword analysis expert specializing in clustering and categorization.";
pub const MAPPING_SYSTEM: &str =
    "You are a helpful assistant specializing in data analysis.";
pub const REPORT_SYSTEM: &str =
    "You are a PPC advertising specialist with deep expertise in keyword analysis.";

/// Primary classification: two independent taxonomies, 5-8 categories each.
pub fn classify_prompt(tokens: &[String], service_description: &str) -> String {
    format!(
        "You are a search advertising expert. Analyze the keyword list below \
         and classify each keyword along two independent dimensions.\n\n\
         Service overview:\n{service_description}\n\n\
         Keywords to analyze:\n{keywords}\n\n\
         Classify every keyword along both dimensions and reply as JSON:\n\
         1. axis_category: the core service concept or function the keyword \
         expresses (aim for 5-8 categories total)\n\
         2. combination_category: the search intent, modifier, or user need \
         (aim for 5-8 categories total)\n\n\
         Response format:\n\
         ```json\n\
         [\n\
           {{\n\
             \"keyword\": \"keyword 1\",\n\
             \"axis_category\": \"Category A\",\n\
             \"combination_category\": \"Category X\"\n\
           }}\n\
         ]\n\
         ```\n\n\
         Keep category names short and descriptive.",
        keywords = tokens.join(", "),
    )
}

/// Fallback clustering: a relaxed grouping request with a cluster count
/// scaled to the batch, minimum 2.
pub fn cluster_prompt(tokens: &[String], service_description: &str, cluster_count: usize) -> String {
    format!(
        "You are a keyword analysis expert. Group the keywords below into \
         semantically related clusters.\n\n\
         Service overview:\n{service_description}\n\n\
         Keyword list:\n{keywords}\n\n\
         Task:\n\
         1. Assign each keyword an axis category (core service concepts, \
         about {cluster_count} groups) and a combination category (search \
         intent and modifiers, about {cluster_count} groups).\n\
         2. Reply in this JSON format:\n\
         ```json\n\
         [\n\
           {{\n\
             \"keyword\": \"keyword 1\",\n\
             \"axis_category\": \"Axis A\",\n\
             \"combination_category\": \"Combination X\"\n\
           }}\n\
         ]\n\
         ```\n\n\
         Keep category names short. Every keyword must receive both \
         categories.",
        keywords = tokens.join(", "),
    )
}

/// Column-mapping suggestion: all labels in one call.
pub fn mapping_prompt(labels: &[String]) -> String {
    let field_lines: String = CanonicalField::ALL
        .iter()
        .map(|f| {
            let tag = if f.is_required() { "required" } else { "recommended" };
            format!("- {}: ({tag})\n", f.name())
        })
        .collect();

    format!(
        "You are a search advertising data analyst. Map each spreadsheet \
         column label below to the best-matching standard column name.\n\n\
         Input column labels:\n{labels}\n\n\
         Standard column names:\n{field_lines}\n\
         For each input label pick the most appropriate standard name, or \
         \"unknown\" if none fits. Reply as JSON:\n\n\
         ```json\n\
         {{\n\
           \"input label 1\": \"StandardName1\",\n\
           \"input label 2\": \"StandardName2\"\n\
         }}\n\
         ```",
        labels = labels.join(", "),
    )
}

/// Narrative report over pre-aggregated rollup tables. The digest is
/// rendered upstream; this only frames it.
pub fn report_prompt(digest: &str, service_description: &str) -> String {
    format!(
        "You are a search advertising analyst. Write a keyword analysis \
         report based on the data below.\n\n\
         Service overview:\n{service_description}\n\n\
         {digest}\n\
         Report structure:\n\
         1. Overall summary - main trends and findings\n\
         2. Axis category analysis - the most effective categories and those \
         needing optimization\n\
         3. Combination category analysis - insights about user intent\n\
         4. Match type optimization - performance by match type and suggestions\n\
         5. Optimization proposals - three concrete improvement actions\n\n\
         Focus on: CPA efficiency across categories, what drives CVR, budget \
         reallocation, and keyword add/exclude candidates."
    )
}
