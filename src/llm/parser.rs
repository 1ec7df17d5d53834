//! Response parsing for LLM outputs.
//!
//! Models are asked for bare SQL but routinely wrap it in markdown fences or
//! add prose around a fenced block. Normalization keeps only the query text.

/// Normalizes a model response into query text.
///
/// Uses the first fenced code block when one is present (any language tag).
/// Otherwise strips stray leading/trailing fence markers. The result is
/// trimmed and may be empty; callers treat an empty result as a failure.
pub fn normalize_sql_response(response: &str) -> String {
    if let Some(block) = extract_first_code_block(response) {
        if !block.trim().is_empty() {
            return block.trim().to_string();
        }
    }

    strip_fences(response.trim()).trim().to_string()
}

/// Extracts the body of the first complete ```` ``` ```` block.
fn extract_first_code_block(text: &str) -> Option<&str> {
    let start_idx = text.find("```")?;
    let after_fence = &text[start_idx + 3..];

    // The rest of the opening line is a language tag
    let content_start = after_fence.find('\n')? + 1;
    let content = &after_fence[content_start..];
    let end_idx = content.find("```")?;

    Some(&content[..end_idx])
}

/// Removes an unterminated opening fence (with optional language tag) and a
/// dangling closing fence.
fn strip_fences(text: &str) -> &str {
    let mut text = text;

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        text = if tag.is_empty()
            || tag.eq_ignore_ascii_case("sql")
            || tag.eq_ignore_ascii_case("sqlite")
        {
            &rest[tag_len..]
        } else {
            rest
        };
    }

    text.trim_end().strip_suffix("```").unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_sql_is_trimmed() {
        assert_eq!(
            normalize_sql_response("  SELECT * FROM companies LIMIT 10  \n"),
            "SELECT * FROM companies LIMIT 10"
        );
    }

    #[test]
    fn test_sql_fenced_block() {
        let response = "```sql\nSELECT COUNT(*) FROM companies\n```";
        assert_eq!(
            normalize_sql_response(response),
            "SELECT COUNT(*) FROM companies"
        );
    }

    #[test]
    fn test_untagged_fenced_block() {
        let response = "```\nSELECT 1\n```";
        assert_eq!(normalize_sql_response(response), "SELECT 1");
    }

    #[test]
    fn test_block_surrounded_by_prose() {
        let response = "Here is your query:\n\n```sql\nSELECT \"CompanyName\" FROM companies\n```\n\nIt lists names.";
        assert_eq!(
            normalize_sql_response(response),
            "SELECT \"CompanyName\" FROM companies"
        );
    }

    #[test]
    fn test_first_block_wins() {
        let response = "```sql\nSELECT 1\n```\nor\n```sql\nSELECT 2\n```";
        assert_eq!(normalize_sql_response(response), "SELECT 1");
    }

    #[test]
    fn test_unterminated_fence_is_stripped() {
        assert_eq!(normalize_sql_response("```sql SELECT 1"), "SELECT 1");
        assert_eq!(normalize_sql_response("SELECT 1\n```"), "SELECT 1");
        assert_eq!(normalize_sql_response("```sql SELECT 1\n```"), "SELECT 1");
        assert_eq!(normalize_sql_response("```SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_empty_after_normalization() {
        assert_eq!(normalize_sql_response(""), "");
        assert_eq!(normalize_sql_response("```sql\n\n```"), "");
        assert_eq!(normalize_sql_response("   "), "");
    }
}
