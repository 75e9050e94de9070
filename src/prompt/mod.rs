// Declare submodules
mod category;
mod normalization;
mod report;

pub use category::{
    graveyard_prompt, incumbent_prompt, interesting_prompt, prompt_for_category,
    region_specific_prompt, regional_prompt,
};
pub use normalization::normalization_prompt;
pub use report::{company_description_prompt, report_prompt};
