//! Normalize command - show which cache entry an identifier maps to.

use anyhow::Result;

use super::Context;
use crate::format::{NormalizedIdentifier, format_normalized_text};

pub fn cmd_normalize(identifiers: &[String], ctx: &Context) -> Result<()> {
    print!("{}", render(identifiers, ctx)?);
    Ok(())
}

fn render(identifiers: &[String], ctx: &Context) -> Result<String> {
    let rows: Vec<_> = identifiers
        .iter()
        .map(|id| NormalizedIdentifier::new(id))
        .collect();

    if ctx.is_json() {
        ctx.opts.as_json(&rows)
    } else {
        Ok(format_normalized_text(&rows, &ctx.opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::commands::test_support::temp_context;

    #[test]
    fn test_equivalent_identifiers_render_same_key() {
        let (_dir, ctx) = temp_context(OutputFormat::Json);
        let ids = vec![
            "local_f00d".to_string(),
            "photo_f00d".to_string(),
            "f00d".to_string(),
        ];
        let json: serde_json::Value = serde_json::from_str(&render(&ids, &ctx).unwrap()).unwrap();
        let keys: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["key"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["f00d", "f00d", "f00d"]);
    }

    #[test]
    fn test_text_output_lists_each_identifier() {
        let (_dir, ctx) = temp_context(OutputFormat::Text);
        let ids = vec!["https://cdn.example.com/s/k1_2.jpg".to_string()];
        let text = render(&ids, &ctx).unwrap();
        assert!(text.contains("remote"));
        assert!(text.contains("k1"));
    }
}
