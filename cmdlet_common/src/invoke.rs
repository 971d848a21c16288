//! Runs a bound cmdlet against a service client.
//!
//! Non-paginated cmdlets make one call. Paginated cmdlets drive a `Paginator`
//! over the request body; every page is projected and handed to the sink
//! before the next page is requested, so values written before a failure stay
//! written.
use log::{debug, info};
use serde_json::Value;

use crate::client::ServiceClient;
use crate::cmdlet::{CmdletSpec, PaginationSpec};
use crate::output::{Projection, Selector};
use crate::paginator::{IterationMode, Page, Paginator, TokenCursor};
use crate::params::BoundParameters;
use crate::result::Result;
use crate::token::ContinuationToken;
use crate::wire::ServiceCall;

/// Call metadata resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSettings {
    /// Region attached to every call.
    pub region: String,
    /// Profile name attached to every call.
    pub profile: Option<String>,
}

/// What an invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationSummary {
    /// Calls issued.
    pub pages: usize,
    /// Values handed to the sink.
    pub emitted: usize,
    /// Cursor to continue from; only set when the caller controls paging.
    pub next_token: Option<ContinuationToken>,
}

/// JSON request body whose token lives at a top-level member.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    /// Request body.
    pub body: Value,
    token_member: &'static str,
}

impl JsonRequest {
    /// Wraps `body`, reading and writing the token at `token_member`.
    pub fn new(body: Value, token_member: &'static str) -> Self {
        Self { body, token_member }
    }
}

impl TokenCursor for JsonRequest {
    fn token(&self) -> Option<&str> {
        self.body.get(self.token_member).and_then(Value::as_str)
    }

    fn set_token(&mut self, token: Option<&ContinuationToken>) {
        if let Some(object) = self.body.as_object_mut() {
            match token {
                Some(token) => {
                    object.insert(self.token_member.to_string(), Value::String(token.to_string()));
                }
                None => {
                    object.remove(self.token_member);
                }
            }
        }
    }
}

/// Runs `spec` with the projection chosen by `-Select` (or the cmdlet default).
pub fn invoke<C, S>(
    client: &C,
    spec: &CmdletSpec,
    bound: &BoundParameters,
    settings: &CallSettings,
    sink: S,
) -> Result<InvocationSummary>
where
    C: ServiceClient + ?Sized,
    S: FnMut(Value) -> Result<()>,
{
    let selector = Selector::resolve(bound.common.select.as_deref(), spec.default_selection())?;
    invoke_with(client, spec, bound, settings, &selector, sink)
}

/// Runs `spec`, writing what `projection` selects from each response.
pub fn invoke_with<C, P, S>(
    client: &C,
    spec: &CmdletSpec,
    bound: &BoundParameters,
    settings: &CallSettings,
    projection: &P,
    mut sink: S,
) -> Result<InvocationSummary>
where
    C: ServiceClient + ?Sized,
    P: Projection + ?Sized,
    S: FnMut(Value) -> Result<()>,
{
    let mut template = ServiceCall::new(
        spec.service,
        spec.operation,
        bound.common.region.as_deref().unwrap_or(&settings.region),
    );
    template.profile = bound.common.profile_name.clone().or_else(|| settings.profile.clone());
    let body = bound.to_request(spec)?;
    debug!("{} request: {}", spec.name, body);

    let Some(pagination) = spec.pagination else {
        let response = client.call(&template.with_payload(body))?;
        let mut summary = InvocationSummary {
            pages: 1,
            ..Default::default()
        };
        for value in projection.project(&response, bound) {
            sink(value)?;
            summary.emitted += 1;
        }
        return Ok(summary);
    };

    paginate(client, spec, pagination, bound, template, body, projection, sink)
}

#[allow(clippy::too_many_arguments)]
fn paginate<C, P, S>(
    client: &C,
    spec: &CmdletSpec,
    pagination: PaginationSpec,
    bound: &BoundParameters,
    template: ServiceCall,
    body: Value,
    projection: &P,
    mut sink: S,
) -> Result<InvocationSummary>
where
    C: ServiceClient + ?Sized,
    P: Projection + ?Sized,
    S: FnMut(Value) -> Result<()>,
{
    let mode = if bound.common.user_controls_paging() {
        IterationMode::SinglePage
    } else {
        IterationMode::Auto
    };

    let mut request = JsonRequest::new(body, pagination.input_token);
    let start = bound.common.next_token.as_deref().and_then(ContinuationToken::new);
    request.set_token(start.as_ref());

    let mut paginator = Paginator::new(request, mode, |req: &JsonRequest| {
        let response = client.call(&template.clone().with_payload(req.body.clone()))?;
        let next_token = ContinuationToken::from_member(&response, pagination.output_token);
        Ok(Page {
            items: response,
            next_token,
        })
    });

    let mut summary = InvocationSummary::default();
    for (number, page) in paginator.by_ref().enumerate() {
        let page = page?;
        let values = projection.project(&page.items, bound);
        info!(
            "{}: page {} returned {} value(s)",
            spec.name,
            number + 1,
            values.len()
        );
        for value in values {
            sink(value)?;
            summary.emitted += 1;
        }
    }
    summary.pages = paginator.pages_fetched();

    if mode == IterationMode::SinglePage {
        summary.next_token = paginator.next_token().cloned();
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::error::CmdletError;
    use crate::params::bind;
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves `total` numbered groups, `per_page` at a time, optionally failing on one call.
    struct FakeGreengrass {
        total: usize,
        per_page: usize,
        fail_on_call: Option<usize>,
        calls: RefCell<Vec<ServiceCall>>,
    }

    impl FakeGreengrass {
        fn new(total: usize, per_page: usize) -> Self {
            Self {
                total,
                per_page,
                fail_on_call: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ServiceClient for FakeGreengrass {
        fn call(&self, call: &ServiceCall) -> Result<Value> {
            self.calls.borrow_mut().push(call.clone());
            if self.fail_on_call == Some(self.calls.borrow().len()) {
                return Err(CmdletError::Service {
                    code: "ServiceUnavailable".into(),
                    message: "down".into(),
                });
            }
            let start: usize = call.payload["NextToken"]
                .as_str()
                .map(|t| t.parse().unwrap())
                .unwrap_or(0);
            let end = (start + self.per_page).min(self.total);
            let groups: Vec<Value> = (start..end).map(|i| json!({"Id": format!("g{i}")})).collect();
            let mut body = json!({"Groups": groups});
            if end < self.total {
                body["NextToken"] = json!(end.to_string());
            }
            Ok(body)
        }
    }

    fn settings() -> CallSettings {
        CallSettings {
            region: "us-east-1".into(),
            profile: None,
        }
    }

    fn run(client: &FakeGreengrass, args: &[&str]) -> (Result<InvocationSummary>, Vec<Value>) {
        let spec = catalog::find("Get-GGGroupList").unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let bound = bind(spec, &args).unwrap();
        let mut out = Vec::new();
        let result = invoke(client, spec, &bound, &settings(), |v| {
            out.push(v);
            Ok(())
        });
        (result, out)
    }

    #[test]
    fn auto_iteration_writes_every_item() {
        let client = FakeGreengrass::new(7, 3);
        let (result, out) = run(&client, &[]);
        let summary = result.unwrap();

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.emitted, 7);
        assert_eq!(summary.next_token, None);
        assert_eq!(out.first(), Some(&json!({"Id": "g0"})));
        assert_eq!(out.last(), Some(&json!({"Id": "g6"})));
    }

    #[test]
    fn no_auto_iteration_returns_the_cursor() {
        let client = FakeGreengrass::new(7, 3);
        let (result, out) = run(&client, &["-NoAutoIteration"]);
        let summary = result.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(summary.next_token.map(ContinuationToken::into_string), Some("3".to_string()));
        assert_eq!(client.calls.borrow().len(), 1);
    }

    #[test]
    fn explicit_next_token_fetches_one_page_from_there() {
        let client = FakeGreengrass::new(7, 3);
        let (result, out) = run(&client, &["-NextToken", "3"]);

        assert_eq!(out, vec![json!({"Id": "g3"}), json!({"Id": "g4"}), json!({"Id": "g5"})]);
        assert_eq!(
            result.unwrap().next_token.map(ContinuationToken::into_string),
            Some("6".to_string())
        );
    }

    #[test]
    fn explicit_empty_next_token_starts_over() {
        let client = FakeGreengrass::new(7, 3);
        let (_, out) = run(&client, &["-NextToken", ""]);

        assert_eq!(out.first(), Some(&json!({"Id": "g0"})));
        assert!(client.calls.borrow()[0].payload.get("NextToken").is_none());
    }

    #[test]
    fn failure_keeps_values_already_written() {
        let mut client = FakeGreengrass::new(9, 3);
        client.fail_on_call = Some(2);
        let (result, out) = run(&client, &[]);

        assert!(matches!(result, Err(CmdletError::Service { .. })));
        assert_eq!(out.len(), 3);
        assert_eq!(client.calls.borrow().len(), 2);
    }

    #[test]
    fn page_size_and_overrides_reach_the_call() {
        let client = FakeGreengrass::new(2, 5);
        let (result, _) = run(
            &client,
            &["-MaxResult", "2", "-Region", "eu-central-1", "-ProfileName", "ops"],
        );
        result.unwrap();

        let call = &client.calls.borrow()[0];
        assert_eq!(call.payload["MaxResults"], json!(2));
        assert_eq!(call.region, "eu-central-1");
        assert_eq!(call.profile.as_deref(), Some("ops"));
    }

    #[test]
    fn select_whole_response_writes_each_page() {
        let client = FakeGreengrass::new(5, 3);
        let (_, out) = run(&client, &["-Select", "*"]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["NextToken"], json!("3"));
    }

    #[test]
    fn sink_errors_stop_the_invocation() {
        let client = FakeGreengrass::new(9, 3);
        let spec = catalog::find("Get-GGGroupList").unwrap();
        let bound = BoundParameters::default();
        let result = invoke(&client, spec, &bound, &settings(), |_| {
            Err(CmdletError::Format("stdout closed".into()))
        });

        assert!(matches!(result, Err(CmdletError::Format(_))));
        assert_eq!(client.calls.borrow().len(), 1);
    }
}
