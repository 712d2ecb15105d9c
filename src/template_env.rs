use minijinja::Environment;
use serde::Serialize;

pub const PAGE_TEMPLATE: &str = "jobsheet.html";
const STYLESHEET: &str = "jobsheet.css";

pub fn setup_template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(PAGE_TEMPLATE, include_str!("../templates/jobsheet.html"))?;
    env.add_template(STYLESHEET, include_str!("../templates/jobsheet.css"))?;
    Ok(env)
}

pub fn render_template<C: Serialize>(
    env: &Environment<'static>,
    page: &C,
) -> Result<String, minijinja::Error> {
    let template = env.get_template(PAGE_TEMPLATE)?;
    template.render(page)
}
