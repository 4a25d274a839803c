pub mod intent;
pub mod session;

use anyhow::{Context, Result, anyhow};
use chrono::{Days, Local, NaiveDate};
use reqwest::Client;
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::browser::{BrowserLauncher, HttpPageLauncher, WebDriverLauncher};
use crate::config::{BrowserBackend, Config, HotelSource};
use crate::flights::{FlightClient, FlightQuery};
use crate::hotels::render::render_search;
use crate::hotels::search::HotelSearcher;
use crate::hotels::travel_advisor::TravelAdvisorClient;
use crate::hotels::{HotelLookup, HotelQuery, HotelSearch, SortOrder};
use crate::model::Message;
use crate::model_gateway::{HostModelGateway, ModelGateway};

use intent::{Command, FlightRequest, HotelRequest, Intent, classify};
use session::SessionState;

pub const HELP: &str = "\
hotel searches:  cheapest hotels in Lisbon for 3 nights | top rated hotel in Rome
flight lookups:  flights from Paris to Rome on 2026-11-15
commands:        /sort price | /sort rating | /results | /nights N | /checkin YYYY-MM-DD
                 /history | /reset | /help | exit";

const NO_RESULTS_YET: &str = "No hotel results yet. Try: cheapest hotels in Lisbon";

/// What the caller should do after one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Reply(String),
    Exit,
}

/// Routes each line of input to a hotel search, a flight lookup, a session
/// command, or the chat model.
pub struct Assistant<'a> {
    cfg: &'a Config,
    model: Box<dyn ModelGateway + 'a>,
    hotels: Box<dyn HotelLookup + 'a>,
    flights: FlightClient,
    state: SessionState,
}

impl<'a> Assistant<'a> {
    pub fn new(
        cfg: &'a Config,
        model: Box<dyn ModelGateway + 'a>,
        hotels: Box<dyn HotelLookup + 'a>,
        flights: FlightClient,
    ) -> Self {
        Self {
            cfg,
            model,
            hotels,
            flights,
            state: SessionState::new(cfg),
        }
    }

    pub fn from_config(client: &'a Client, cfg: &'a Config) -> Result<Self> {
        let hotels: Box<dyn HotelLookup + 'a> = match cfg.hotel_source {
            HotelSource::Scrape => Box::new(Self::scraper(client, cfg)?),
            HotelSource::TravelAdvisor => {
                Box::new(TravelAdvisorClient::from_config(client.clone(), cfg))
            }
        };

        Ok(Self::new(
            cfg,
            Box::new(HostModelGateway::new(client, cfg)),
            hotels,
            FlightClient::from_config(client.clone(), cfg),
        ))
    }

    fn scraper(client: &Client, cfg: &Config) -> Result<HotelSearcher<'a>> {
        let launcher: Box<dyn BrowserLauncher + 'a> = match cfg.browser_backend {
            BrowserBackend::WebDriver => Box::new(WebDriverLauncher::new(
                client.clone(),
                cfg.webdriver_url.clone(),
                cfg.http_timeout_secs,
            )),
            BrowserBackend::Http => Box::new(HttpPageLauncher::new(
                client.clone(),
                cfg.retry_policy.clone(),
                cfg.http_timeout_secs,
            )),
        };
        HotelSearcher::new(launcher, cfg.hotel_search_url.clone(), cfg.hotel_wait_secs)
            .context("Failed to set up hotel search")
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &[Message] {
        self.state.chat.messages()
    }

    pub async fn respond(&mut self, input: &str) -> Result<Turn> {
        match classify(input) {
            Intent::Exit => Ok(Turn::Exit),
            intent => self.handle(intent).await.map(Turn::Reply),
        }
    }

    pub async fn handle(&mut self, intent: Intent) -> Result<String> {
        match intent {
            Intent::Exit => Ok("bye".to_string()),
            Intent::Command(command) => Ok(self.run_command(command)),
            Intent::Hotel(request) => self.search_hotels(request).await,
            Intent::Flight(request) => self.search_flights(request).await,
            Intent::Usage(hint) => Ok(hint.to_string()),
            Intent::Chat(text) => self.chat(text).await,
        }
    }

    fn default_date(&self) -> Result<NaiveDate> {
        let offset = Days::new(u64::from(self.cfg.default_checkin_offset_days));
        Local::now()
            .date_naive()
            .checked_add_days(offset)
            .ok_or_else(|| anyhow!("DEFAULT_CHECKIN_OFFSET_DAYS puts the date out of range"))
    }

    async fn search_hotels(&mut self, request: HotelRequest) -> Result<String> {
        let checkin = match self.state.checkin {
            Some(date) => date,
            None => self.default_date()?,
        };
        let nights = request.nights.unwrap_or(self.state.nights);
        let query = HotelQuery::new(request.city, checkin, nights)?;

        let mut outcome = self
            .hotels
            .lookup(&query)
            .await
            .with_context(|| format!("Hotel search for '{}' failed", query.city))?;
        if let Some(order) = request.sort {
            outcome.sort(order);
        }

        let search = HotelSearch { query, outcome };
        let rendered = render_search(&search);
        self.state.last_search = Some(search);
        Ok(rendered)
    }

    async fn search_flights(&mut self, request: FlightRequest) -> Result<String> {
        let date = match request.date {
            Some(date) => date,
            None => self.default_date()?,
        };
        let query = FlightQuery {
            origin: request.origin,
            destination: request.destination,
            date,
        };

        let offers = self.flights.search(&query).await.with_context(|| {
            format!(
                "Flight lookup {} -> {} failed",
                query.origin, query.destination
            )
        })?;
        if offers.is_empty() {
            return Ok("No flights found.".to_string());
        }

        let mut out = format!(
            "Flights {} -> {} on {}\n",
            query.origin,
            query.destination,
            query.date.format("%Y/%m/%d")
        );
        for offer in &offers {
            let _ = writeln!(out, "{}", offer.summary());
        }
        Ok(out)
    }

    async fn chat(&mut self, text: String) -> Result<String> {
        self.state.chat.push(Message::user(text));

        match self.model.chat(self.state.chat.messages()).await {
            Ok(answer) => {
                let answer = answer.trim().to_string();
                self.state.chat.push(Message::assistant(answer.clone()));
                Ok(answer)
            }
            Err(err) => {
                // history holds answered turns only
                self.state.chat.pop();
                Err(err)
            }
        }
    }

    fn resort(&mut self, order: SortOrder) -> String {
        match self.state.last_search.as_mut() {
            Some(search) => {
                search.outcome.sort(order);
                info!(order = order.label(), "re-sorted held hotel results");
                render_search(search)
            }
            None => NO_RESULTS_YET.to_string(),
        }
    }

    fn run_command(&mut self, command: Command) -> String {
        match command {
            Command::Sort(order) => self.resort(order),
            Command::Results => match &self.state.last_search {
                Some(search) => render_search(search),
                None => NO_RESULTS_YET.to_string(),
            },
            Command::Nights(nights) => {
                self.state.nights = nights;
                format!(
                    "Next hotel search covers {nights} night{}.",
                    if nights == 1 { "" } else { "s" }
                )
            }
            Command::Checkin(date) => {
                self.state.checkin = Some(date);
                format!("Next hotel search checks in on {}.", date.format("%Y-%m-%d"))
            }
            Command::History => format_history(self.history()),
            Command::Reset => {
                self.state.chat.reset();
                "conversation reset".to_string()
            }
            Command::Help => HELP.to_string(),
            Command::Invalid(message) => {
                warn!(message = %message, "rejected command");
                message
            }
        }
    }
}

pub fn format_history(history: &[Message]) -> String {
    if history.is_empty() {
        return "(history is empty)".to_string();
    }

    let mut out = String::new();
    for (idx, msg) in history.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}: {}", idx, msg.role.as_str(), msg.content);
    }
    out
}
