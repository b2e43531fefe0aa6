use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

use super::charts::Chart;
use super::filter::{FilterForm, VoterFilter};
use super::models::{self as store, Voter};
use super::pagination::Page;
use crate::error::Result;
use crate::state::AppState;
use crate::templates::render;

const LIST_BIRTH_YEARS: std::ops::Range<i32> = 1900..2025;
const GRAPH_BIRTH_YEARS: std::ops::Range<i32> = 1900..2010;

#[derive(Template)]
#[template(path = "voter_analytics/voter_list.html")]
struct VoterListTemplate {
    voters: Vec<Voter>,
    page: Page,
    form: FilterForm,
    query: String,
}

#[derive(Template)]
#[template(path = "voter_analytics/voter_detail.html")]
struct VoterDetailTemplate {
    voter: Voter,
}

#[derive(Template)]
#[template(path = "voter_analytics/graphs.html")]
struct GraphsTemplate {
    form: FilterForm,
    total: usize,
    charts: Vec<ChartView>,
}

struct ChartView {
    id: String,
    json: String,
}

impl From<Chart> for ChartView {
    fn from(chart: Chart) -> Self {
        Self {
            json: chart.to_script_json(),
            id: chart.id,
        }
    }
}

pub async fn voter_list(
    State(state): State<AppState>,
    Query(filter): Query<VoterFilter>,
) -> Result<impl IntoResponse> {
    let per_page = state.config.voter_analytics.page_size;
    let template = {
        let conn = state.db.conn()?;
        let total = store::count_voters(&conn, &filter)?;
        let page = Page::resolve(filter.page.as_deref(), total, per_page)?;
        VoterListTemplate {
            voters: store::voters_page(&conn, &filter, &page)?,
            page,
            form: filter.form(store::party_choices(&conn)?, LIST_BIRTH_YEARS),
            query: filter.query_string(),
        }
    };
    render(&template)
}

pub async fn voter_detail(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<impl IntoResponse> {
    let voter = store::require_voter(&*state.db.conn()?, pk)?;
    render(&VoterDetailTemplate { voter })
}

pub async fn graphs(
    State(state): State<AppState>,
    Query(filter): Query<VoterFilter>,
) -> Result<impl IntoResponse> {
    let template = {
        let conn = state.db.conn()?;
        let (years, year_counts): (Vec<i32>, Vec<i64>) =
            store::birth_year_counts(&conn, &filter)?.into_iter().unzip();
        let (parties, party_counts): (Vec<String>, Vec<i64>) =
            store::party_counts(&conn, &filter)?.into_iter().unzip();
        let (elections, turnout): (Vec<&str>, Vec<i64>) =
            store::participation_counts(&conn, &filter)?.into_iter().unzip();

        let charts = vec![
            Chart::new("birth-year-graph", "Distribution of Voters by Birth Year").bar(&years, &year_counts),
            Chart::new("party-affiliation-graph", "Distribution of Voters by Party Affiliation")
                .pie(&parties, &party_counts),
            Chart::new("election-participation-graph", "Voter Participation by Election")
                .bar(&elections, &turnout),
        ];
        GraphsTemplate {
            total: store::count_voters(&conn, &filter)?,
            form: filter.form(store::party_choices(&conn)?, GRAPH_BIRTH_YEARS),
            charts: charts.into_iter().map(ChartView::from).collect(),
        }
    };
    render(&template)
}
