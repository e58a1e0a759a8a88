//! Question service implementation.

use crate::background::BackgroundTasks;
use crate::counter_cache::{CounterCache, IncrementOutcome};
use crate::dto::{
    AddCommentRequest, CreateQuestionRequest, QuestionListItem, QuestionListResponse,
    QuestionResponse, UpdateQuestionRequest,
};
use crate::invalidator::CacheInvalidator;
use crate::question_service::QuestionService;
use crate::response_cache::ResponseCache;
use crate::view_dedup::ViewDedupGuard;
use askboard_core::{
    AskError, AskResult, Comment, CounterKind, MutationKind, NewQuestion, QuestionDetail,
    QuestionId, QuestionSummary, QuestionUpdate, ValidateExt,
};
use askboard_repository::QuestionRepository;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of questions in the recent list.
pub const RECENT_QUESTIONS_LIMIT: u32 = 10;

/// Question service over the durable repository and the counter layer.
pub struct QuestionServiceImpl {
    questions: Arc<dyn QuestionRepository>,
    counters: Arc<CounterCache>,
    dedup: Arc<ViewDedupGuard>,
    responses: Arc<ResponseCache>,
    invalidator: Arc<CacheInvalidator>,
    background: BackgroundTasks,
}

impl QuestionServiceImpl {
    /// Creates a new question service.
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        counters: Arc<CounterCache>,
        dedup: Arc<ViewDedupGuard>,
        responses: Arc<ResponseCache>,
        invalidator: Arc<CacheInvalidator>,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            questions,
            counters,
            dedup,
            responses,
            invalidator,
            background,
        }
    }

    async fn load_detail(&self, id: QuestionId) -> AskResult<QuestionDetail> {
        if let Some(detail) = self.responses.get(id).await {
            return Ok(detail);
        }

        let question = self
            .questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AskError::not_found("Question", id))?;
        let tags = self.questions.find_tags(id).await?;
        let comments = self.questions.find_comments(id).await?;

        let detail = QuestionDetail {
            question,
            tags,
            comments,
        };
        self.responses.put(id, &detail).await;

        Ok(detail)
    }

    async fn load_summaries(&self) -> AskResult<Vec<QuestionSummary>> {
        if let Some(summaries) = self.responses.get_list().await {
            return Ok(summaries);
        }

        let questions = self.questions.find_recent(RECENT_QUESTIONS_LIMIT).await?;
        let mut summaries = Vec::with_capacity(questions.len());
        for question in questions {
            let tags = self.questions.find_tags(question.id).await?;
            summaries.push(QuestionSummary::new(question, tags));
        }
        self.responses.put_list(&summaries).await;

        Ok(summaries)
    }

    async fn ensure_exists(&self, id: QuestionId) -> AskResult<()> {
        if self.questions.exists(id).await? {
            Ok(())
        } else {
            Err(AskError::not_found("Question", id))
        }
    }
}

#[async_trait]
impl QuestionService for QuestionServiceImpl {
    async fn get_question(&self, id: QuestionId, viewer_key: &str) -> AskResult<QuestionResponse> {
        debug!("Getting question: {}", id);

        let detail = self.load_detail(id).await?;

        if self.dedup.should_count_view(id, viewer_key).await {
            let counters = Arc::clone(&self.counters);
            self.background
                .spawn("increment_view", async move { counters.increment_view(id).await });
        }

        let counters = self.counters.get_counters(id).await?;
        Ok(QuestionResponse::from_detail(detail, counters))
    }

    async fn list_questions(&self) -> AskResult<QuestionListResponse> {
        debug!("Listing recent questions");

        let summaries = self.load_summaries().await?;
        let counters = try_join_all(
            summaries
                .iter()
                .map(|summary| self.counters.get_counters(summary.question.id)),
        )
        .await?;

        let questions = summaries
            .into_iter()
            .zip(counters)
            .map(|(summary, counters)| QuestionListItem::from_summary(summary, counters))
            .collect();
        Ok(QuestionListResponse { questions })
    }

    async fn create_question(&self, request: CreateQuestionRequest) -> AskResult<QuestionId> {
        debug!("Creating question: {}", request.title);

        request.validate_request()?;

        let question = NewQuestion::from(request);
        let id = self.questions.create(&question).await?;

        self.invalidator.on_mutation(MutationKind::NewQuestion, id).await;

        info!("Question created: {}", id);
        Ok(id)
    }

    async fn update_question(&self, id: QuestionId, request: UpdateQuestionRequest) -> AskResult<()> {
        debug!("Updating question: {}", id);

        request.validate_request()?;

        let update = QuestionUpdate::from(request);
        if update.is_empty() {
            return Err(AskError::validation("Nothing to update"));
        }

        if !self.questions.update(id, &update).await? {
            return Err(AskError::not_found("Question", id));
        }

        self.invalidator.on_mutation(MutationKind::QuestionEdited, id).await;

        info!("Question updated: {}", id);
        Ok(())
    }

    async fn add_comment(&self, id: QuestionId, request: AddCommentRequest) -> AskResult<Comment> {
        debug!("Adding comment to question: {}", id);

        request.validate_request()?;
        self.ensure_exists(id).await?;

        let comment = self.questions.add_comment(id, &request.content).await?;

        self.invalidator.on_mutation(MutationKind::NewComment, id).await;

        info!("Comment {} added to question {}", comment.id, id);
        Ok(comment)
    }

    async fn like_question(&self, id: QuestionId) -> AskResult<()> {
        debug!("Liking question: {}", id);

        self.ensure_exists(id).await?;
        self.questions.record_like(id).await?;

        self.invalidator.on_mutation(MutationKind::NewLike, id).await;

        if let IncrementOutcome::Shadowed(value) =
            self.counters.record_increment(id, CounterKind::Likes).await?
        {
            let counters = Arc::clone(&self.counters);
            self.background.spawn("like_write_through", async move {
                counters.write_through(id, CounterKind::Likes, value).await
            });
        }

        info!("Question liked: {}", id);
        Ok(())
    }
}
