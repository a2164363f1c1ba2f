use yew::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct FooterLink {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FooterData {
    pub pages: Vec<FooterLink>,
    pub twitter: String,
    pub telegram: String,
    pub medium: String,
    pub copyright: String,
}

impl Default for FooterData {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            twitter: String::new(),
            telegram: String::new(),
            medium: String::new(),
            copyright: "Copyright © ColorfulLife. All Rights Reserved".to_string(),
        }
    }
}

impl FooterData {
    /// Social links that are actually configured
    pub fn socials(&self) -> Vec<(&'static str, &str)> {
        [("Twitter", &self.twitter), ("Telegram", &self.telegram), ("Medium", &self.medium)]
            .into_iter()
            .filter(|(_, url)| !url.is_empty())
            .map(|(name, url)| (name, url.as_str()))
            .collect()
    }
}

#[derive(Properties, PartialEq)]
pub struct FooterProps {
    pub data: FooterData,
}

#[function_component(Footer)]
pub fn footer(props: &FooterProps) -> Html {
    let data = &props.data;

    html! {
        <footer class="footer">
            <nav class="footer-pages">
                { for data.pages.iter().map(|p| html! {
                    <a href={p.url.clone()}>{&p.name}</a>
                }) }
            </nav>
            <div class="footer-socials">
                { for data.socials().into_iter().map(|(name, url)| html! {
                    <a href={url.to_string()} target="_blank" rel="noopener noreferrer">{name}</a>
                }) }
            </div>
            <p class="copyright">{&data.copyright}</p>
        </footer>
    }
}
