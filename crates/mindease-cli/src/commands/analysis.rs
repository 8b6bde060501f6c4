use std::path::Path;

use anyhow::Result;
use mindease_application::{AnalysisReport, AppContext};
use mindease_core::Surface;

use crate::render;

pub async fn run(home: Option<&Path>, surface: Surface) -> Result<()> {
    let ctx = AppContext::load(home, false)?;
    let report = AnalysisReport::load(ctx.repository().as_ref(), surface).await?;
    render::report(&report);
    Ok(())
}
