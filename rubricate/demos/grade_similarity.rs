//! Grade an output against a reference by embedding similarity, then against
//! a rubric.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key cargo run --example grade_similarity
//! ```

use rubricate::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rubricate::init_logging();

    let grader = Grader::from_env();

    let expected = "The capital of France is Paris.";
    let output = "Paris is France's capital city.";

    let similarity = grader
        .grade_similarity(expected, output, &GradingConfig::new().with_threshold(0.8))
        .await?;
    println!("similarity: pass={} reason={}", similarity.pass, similarity.reason);

    let rubric = grader
        .matches_llm_rubric(
            "Names the capital of France",
            output,
            None,
            &Vars::new(),
        )
        .await?;
    println!(
        "rubric: pass={} score={} tokens={}",
        rubric.pass, rubric.score, rubric.tokens_used.total
    );

    Ok(())
}
